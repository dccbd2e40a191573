// Descriptor wallet library extending bitcoin & miniscript functionality
// by LNP/BP Association (https://lnp-bp.org)
// Written in 2020-2022 by
//     Dr. Maxim Orlovsky <orlovsky@pandoracore.com>
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the Apache-2.0 License
// along with this software.
// If not, see <https://opensource.org/licenses/Apache-2.0>.

//! Node configuration file holding standardness policy settings.

use std::fs;
use std::io;
use std::path::Path;

use amplify::IoError;
use scripts::StandardnessPolicy;

/// Errors loading configuration file.
#[derive(Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum ConfigError {
    /// unable to read configuration file: {0}
    #[from(io::Error)]
    Io(IoError),

    /// invalid configuration file: {0}
    #[from]
    Yaml(serde_yaml::Error),
}

/// Configuration read once on startup. Missing sections and fields take
/// their default values.
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "kebab-case", default)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Config {
    /// Standardness policy for output scripts.
    pub policy: StandardnessPolicy,
}

impl Config {
    /// Parses configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Config, ConfigError> {
        serde_yaml::from_str(yaml).map_err(ConfigError::from)
    }

    /// Reads configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let file = fs::File::open(path)?;
        serde_yaml::from_reader(file).map_err(ConfigError::from)
    }

    /// Serializes configuration into YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(ConfigError::from)
    }
}
