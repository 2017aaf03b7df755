//! Resolution of shop paths, URLs, modules and test suites.

use indexmap::IndexMap;
use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use super::environment::{EnvironmentSource, override_var_name};
use super::parameters::Parameters;
use super::shop::{self, SHOP_CONFIG_FILE, ShopEdition, ShopId};
use super::value::ConfigValue;
use crate::error::{Error, Result};
use crate::trace_categories;

/// Name of the configuration file, relative to the parent of the vendor directory.
pub const CONFIG_FILE_NAME: &str = "test_config.yml";

/// Environment variable that selects the current test suite.
pub const TEST_SUITE_VAR: &str = "TEST_SUITE";

/// Options for loading a [`TestConfig`].
#[derive(Clone, Debug, bon::Builder)]
pub struct TestConfigOptions {
    /// Root directory of the testing library checkout.
    #[builder(into)]
    pub library_base_path: PathBuf,
    /// Explicit vendor directory; skips discovery relative to the library base path.
    #[builder(into)]
    pub vendor_path: Option<PathBuf>,
    /// Explicit configuration file; defaults to `test_config.yml` next to the vendor
    /// directory.
    #[builder(into)]
    pub config_file: Option<PathBuf>,
    /// Source of environment variable overrides.
    #[builder(default)]
    pub environment: EnvironmentSource,
    /// Path of the test file or directory being run.
    #[builder(into)]
    pub test_target: Option<PathBuf>,
    /// Whether to use the last argument of the current process as the test target when
    /// none is given. Test runners pass the test path last; other tools should disable
    /// this.
    #[builder(default = true)]
    pub test_target_from_args: bool,
}

/// Test configuration backed by the YAML configuration file.
///
/// Every parameter may be overridden by an environment variable named after the
/// parameter in upper case. Derived paths are computed on first use and cached for
/// the lifetime of the instance.
#[derive(Debug)]
pub struct TestConfig {
    options: TestConfigOptions,
    parameters: Parameters,
    vendor_path: PathBuf,
    config_file_path: PathBuf,
    shop_path: OnceCell<PathBuf>,
    shop_edition: OnceCell<ShopEdition>,
    shop_url: OnceCell<String>,
    current_test_suite: OnceCell<PathBuf>,
    test_suites: OnceCell<Vec<PathBuf>>,
}

impl TestConfig {
    /// Locates the vendor directory and loads the configuration file.
    pub fn load(options: TestConfigOptions) -> Result<Self> {
        let (vendor_path, config_file_path) = resolve_locations(&options)?;
        let parameters = Parameters::load(&config_file_path)?;

        Ok(Self::with_parameters(
            options,
            vendor_path,
            config_file_path,
            parameters,
        ))
    }

    /// Creates a configuration from already-loaded parameters.
    pub fn from_parameters(options: TestConfigOptions, parameters: Parameters) -> Result<Self> {
        let (vendor_path, config_file_path) = resolve_locations(&options)?;

        Ok(Self::with_parameters(
            options,
            vendor_path,
            config_file_path,
            parameters,
        ))
    }

    fn with_parameters(
        options: TestConfigOptions,
        vendor_path: PathBuf,
        config_file_path: PathBuf,
        parameters: Parameters,
    ) -> Self {
        Self {
            options,
            parameters,
            vendor_path,
            config_file_path,
            shop_path: OnceCell::new(),
            shop_edition: OnceCell::new(),
            shop_url: OnceCell::new(),
            current_test_suite: OnceCell::new(),
            test_suites: OnceCell::new(),
        }
    }

    /// Returns the parameters as loaded from the configuration file.
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Returns every configured parameter with environment overrides applied.
    pub fn effective_parameters(&self) -> IndexMap<String, ConfigValue> {
        self.parameters
            .iter()
            .filter_map(|(key, _)| self.value(key).map(|value| (key.to_owned(), value)))
            .collect()
    }

    /// Returns the path to the vendor directory.
    pub fn vendor_path(&self) -> &Path {
        &self.vendor_path
    }

    /// Returns the path of the configuration file.
    pub fn config_file_path(&self) -> &Path {
        &self.config_file_path
    }

    /// Returns the effective value of a parameter. An environment variable named after
    /// the parameter in upper case takes precedence over the configuration file.
    pub fn value(&self, param: &str) -> Option<ConfigValue> {
        let var_name = override_var_name(param);
        if let Some(value) = self.options.environment.var(&var_name) {
            tracing::debug!(target: trace_categories::CONFIG, "'{param}' overridden by ${var_name}");
            return Some(ConfigValue::Env(value));
        }

        self.parameters.get(param).cloned().map(ConfigValue::Yaml)
    }

    fn string_value(&self, param: &str) -> Option<String> {
        self.value(param).and_then(|value| value.as_string())
    }

    fn non_empty_string_value(&self, param: &str) -> Option<String> {
        self.string_value(param)
            .filter(|value| !value.trim().is_empty())
    }

    fn flag(&self, param: &str) -> bool {
        self.value(param).is_some_and(|value| value.is_truthy())
    }

    /// Returns the path to the shop source directory.
    ///
    /// An absolute `shop_path` is used as-is. A relative one is resolved by looking for
    /// the shop's `config.inc.php` around the vendor directory, falling back to the
    /// relative path under the vendor directory's parent.
    pub fn shop_path(&self) -> Result<&Path> {
        if let Some(shop_path) = self.shop_path.get() {
            return Ok(shop_path.as_path());
        }

        let configured = self.string_value("shop_path").unwrap_or_default();
        let candidate = if Path::new(&configured).is_absolute() {
            PathBuf::from(&configured)
        } else {
            self.find_shop_path(&configured)
        };

        let shop_path = resolve_path(&candidate)?;
        tracing::debug!(target: trace_categories::CONFIG, "shop path: {}", shop_path.display());

        Ok(self.shop_path.get_or_init(|| shop_path).as_path())
    }

    fn find_shop_path(&self, relative_shop_path: &str) -> PathBuf {
        let vendor = &self.vendor_path;

        // Vendor directory in the shop base directory, in shop/modules/<module>/,
        // or in shop/modules/<vendor>/<module>/.
        let candidates = [
            vendor.join(".."),
            vendor.join("../../.."),
            vendor.join("../../../.."),
        ];

        candidates
            .into_iter()
            .find(|candidate| candidate.join(SHOP_CONFIG_FILE).is_file())
            .unwrap_or_else(|| vendor.join("..").join(relative_shop_path))
    }

    /// Returns the remote directory.
    pub fn remote_directory(&self) -> Option<String> {
        self.string_value("remote_directory")
    }

    /// Returns the shop edition.
    ///
    /// A configured `shop_edition` wins; otherwise the edition is detected from the
    /// shop directory, defaulting to the community edition.
    pub fn shop_edition(&self) -> Result<ShopEdition> {
        if let Some(edition) = self.shop_edition.get() {
            return Ok(*edition);
        }

        let edition = match self.non_empty_string_value("shop_edition") {
            Some(configured) => configured.parse()?,
            None => shop::detect_edition(self.shop_path()?)?.unwrap_or_default(),
        };

        tracing::debug!(target: trace_categories::CONFIG, "shop edition: {edition}");

        Ok(*self.shop_edition.get_or_init(|| edition))
    }

    /// Returns the id of the shop that tests run against.
    pub fn shop_id(&self) -> Result<ShopId> {
        let shop_id = if self.shop_edition()? == ShopEdition::Enterprise {
            if self.flag("is_subshop") {
                ShopId::Numbered(2)
            } else {
                ShopId::Numbered(1)
            }
        } else {
            ShopId::BaseShop
        };

        Ok(shop_id)
    }

    /// Returns whether the tested shop is a subshop.
    pub fn is_sub_shop(&self) -> Result<bool> {
        Ok(self.shop_id()?.is_sub_shop())
    }

    /// Returns the shop URL, always ending with exactly one `/`.
    pub fn shop_url(&self) -> Result<&str> {
        if let Some(url) = self.shop_url.get() {
            return Ok(url.as_str());
        }

        let url = match self.non_empty_string_value("shop_url") {
            Some(url) => url,
            None => {
                let shop_path = self.shop_path()?;
                shop::read_config_shop_url(shop_path)?
                    .ok_or_else(|| Error::ShopUrlNotFound(shop_path.join(SHOP_CONFIG_FILE)))?
            }
        };

        let url = std::format!("{}/", url.trim_end_matches('/'));

        Ok(self.shop_url.get_or_init(|| url).as_str())
    }

    /// Returns the path to the shop's tests. A relative `shop_tests_path` is resolved
    /// against the shop path.
    pub fn shop_tests_path(&self) -> Result<PathBuf> {
        let configured = self.string_value("shop_tests_path").unwrap_or_default();
        let tests_path = if Path::new(&configured).is_absolute() {
            PathBuf::from(configured)
        } else {
            self.shop_path()?.join(configured)
        };

        resolve_path(&tests_path)
    }

    /// Returns the paths of all defined modules, relative to the shop's `modules`
    /// directory.
    pub fn partial_module_paths(&self) -> Vec<String> {
        self.value("partial_module_paths")
            .map(|value| value.as_list())
            .unwrap_or_default()
    }

    /// Returns the modules to activate for the current test run: all defined modules
    /// when `activate_all_modules` is set, otherwise the module containing the current
    /// test suite (if any).
    pub fn modules_to_activate(&self) -> Result<Vec<String>> {
        let modules = self.partial_module_paths();
        if self.should_activate_all_modules() {
            return Ok(modules);
        }

        let current_suite = self.current_test_suite()?;
        let modules_dir = self.shop_path()?.join("modules");

        Ok(modules
            .into_iter()
            .find(|module| current_suite.starts_with(modules_dir.join(module)))
            .into_iter()
            .collect())
    }

    /// Returns the path to the shop setup.
    pub fn shop_setup_path(&self) -> Option<String> {
        self.string_value("shop_setup_path")
    }

    /// Returns the database restoration class name.
    pub fn database_restoration_class(&self) -> Option<String> {
        self.string_value("database_restoration_class")
    }

    /// Returns the serial to use when installing the shop.
    pub fn shop_serial(&self) -> Option<String> {
        self.string_value("shop_serial")
    }

    /// Whether to install the shop before running tests.
    pub fn should_install_shop(&self) -> bool {
        self.flag("install_shop")
    }

    /// Whether to restore the shop database after running all the tests.
    pub fn should_restore_shop_after_tests_suite(&self) -> bool {
        self.flag("restore_shop_after_tests_suite")
    }

    /// Whether to activate all modules when running tests.
    pub fn should_activate_all_modules(&self) -> bool {
        self.flag("activate_all_modules")
    }

    /// Returns the temp directory for storing tests data.
    pub fn temp_directory(&self) -> Option<String> {
        self.string_value("tmp_path")
    }

    /// Whether to enable varnish when running tests.
    pub fn should_enable_varnish(&self) -> bool {
        self.flag("enable_varnish")
    }

    /// Whether to run shop tests.
    pub fn should_run_shop_tests(&self) -> bool {
        self.flag("run_tests_for_shop")
    }

    /// Whether to run module tests.
    pub fn should_run_module_tests(&self) -> bool {
        self.flag("run_tests_for_modules")
    }

    /// Returns the test suite currently being run.
    ///
    /// `TEST_SUITE` from the environment wins. Otherwise this is the first known test
    /// suite containing the test target, falling back to the shop tests path.
    pub fn current_test_suite(&self) -> Result<&Path> {
        if let Some(suite) = self.current_test_suite.get() {
            return Ok(suite.as_path());
        }

        let from_env = self
            .options
            .environment
            .var(TEST_SUITE_VAR)
            .filter(|suite| !suite.is_empty())
            .map(PathBuf::from);

        let suite = match from_env {
            Some(suite) => suite,
            None => match self.suite_containing_test_target()? {
                Some(suite) => suite,
                None => self.shop_tests_path()?,
            },
        };

        tracing::debug!(target: trace_categories::CONFIG, "current test suite: {}", suite.display());

        Ok(self.current_test_suite.get_or_init(|| suite).as_path())
    }

    fn suite_containing_test_target(&self) -> Result<Option<PathBuf>> {
        let target = self.options.test_target.clone().or_else(|| {
            if self.options.test_target_from_args {
                std::env::args_os().last().map(PathBuf::from)
            } else {
                None
            }
        });

        let Some(target) = target.and_then(|target| target.canonicalize().ok()) else {
            return Ok(None);
        };

        Ok(self
            .test_suites()?
            .iter()
            .find(|suite| target.starts_with(suite))
            .cloned())
    }

    /// Returns all test suites: module suites first, then the shop tests path when shop
    /// tests are enabled and the path exists.
    pub fn test_suites(&self) -> Result<&[PathBuf]> {
        if let Some(suites) = self.test_suites.get() {
            return Ok(suites.as_slice());
        }

        let mut suites = self.module_test_suites()?;
        if self.should_run_shop_tests() {
            match self.shop_tests_path() {
                Ok(shop_tests_path) => suites.push(shop_tests_path),
                Err(e) => {
                    tracing::debug!(target: trace_categories::CONFIG, "skipping shop tests: {e}");
                }
            }
        }

        Ok(self.test_suites.get_or_init(|| suites).as_slice())
    }

    /// Returns the `tests` directories of all defined modules that have one, when
    /// module tests are enabled.
    pub fn module_test_suites(&self) -> Result<Vec<PathBuf>> {
        if !self.should_run_module_tests() {
            return Ok(vec![]);
        }

        let modules_dir = self.shop_path()?.join("modules");

        Ok(self
            .partial_module_paths()
            .iter()
            .filter_map(|module| modules_dir.join(module).join("tests").canonicalize().ok())
            .collect())
    }
}

/// Returns the vendor directory and configuration file path for the given options.
fn resolve_locations(options: &TestConfigOptions) -> Result<(PathBuf, PathBuf)> {
    let vendor_path = match &options.vendor_path {
        Some(vendor_path) => resolve_path(vendor_path)?,
        None => discover_vendor_path(&options.library_base_path)?,
    };

    let config_file_path = options
        .config_file
        .clone()
        .unwrap_or_else(|| vendor_path.join("..").join(CONFIG_FILE_NAME));

    Ok((vendor_path, config_file_path))
}

/// Finds the vendor directory for a testing library checked out at `library_base_path`.
///
/// When the library is installed as a dependency, the project's vendor directory is
/// three levels up; otherwise the library's own vendor directory is used.
pub fn discover_vendor_path(library_base_path: &Path) -> Result<PathBuf> {
    let installed = library_base_path.join("../../../vendor");
    let vendor_path = if installed.exists() {
        installed
    } else {
        library_base_path.join("vendor")
    };

    resolve_path(&vendor_path)
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .map_err(|e| Error::PathNotFound(path.to_path_buf(), e))
}
