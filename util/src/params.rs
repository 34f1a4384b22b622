//! Generic parameters functions
//!
//! Parameters are stored in TOML files. A whole file can be deserialised into
//! a parameter struct with [`load`], or wrapped in a [`ParamSource`] which
//! hands out named sections on demand. The latter is used by pluggable items
//! (critics, motion models) which each own a section keyed by their name.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A loaded parameter file from which named sections can be deserialised.
///
/// A section which is not present in the file deserialises to the section
/// struct's `Default`, so parameter files only need to spell out values that
/// differ from the defaults.
#[derive(Debug, Clone)]
pub struct ParamSource {
    root: toml::Value,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot load the parameter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),

    #[error("Cannot read the parameter section `{0}`: {1}")]
    SectionError(String, toml::de::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ParamSource {
    /// Load a parameter source from the given file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let params_str = match read_to_string(path) {
            Ok(s) => s,
            Err(e) => return Err(LoadError::FileLoadError(e)),
        };

        Self::from_str(&params_str)
    }

    /// Build a parameter source from a TOML string.
    pub fn from_str(params_str: &str) -> Result<Self, LoadError> {
        match params_str.parse::<toml::Value>() {
            Ok(root) => Ok(Self { root }),
            Err(e) => Err(LoadError::DeserialiseError(e)),
        }
    }

    /// Deserialise the named top-level section.
    ///
    /// A missing section produces the section struct's default value.
    pub fn section<P>(&self, name: &str) -> Result<P, LoadError>
    where
        P: DeserializeOwned + Default,
    {
        match self.root.get(name) {
            Some(value) => value
                .clone()
                .try_into()
                .map_err(|e| LoadError::SectionError(name.into(), e)),
            None => Ok(P::default()),
        }
    }

    /// True if the named top-level section exists in the file.
    pub fn has_section(&self, name: &str) -> bool {
        self.root.get(name).is_some()
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file into a single parameter struct.
pub fn load<P>(param_file_path: &Path) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    // Load the file into a string
    let params_str = match read_to_string(param_file_path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(e)),
    };

    // Parse the string into the parameter struct
    match toml::from_str(params_str.as_str()) {
        Ok(p) => Ok(p),
        Err(e) => Err(LoadError::DeserialiseError(e)),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default)]
    struct DummyParams {
        weight: f64,
        power: u32,
    }

    impl Default for DummyParams {
        fn default() -> Self {
            Self {
                weight: 1.0,
                power: 1,
            }
        }
    }

    #[test]
    fn test_section_present() {
        let source = ParamSource::from_str(
            "[Dummy]\n\
             weight = 5.0\n\
             power = 2\n",
        )
        .unwrap();

        let params: DummyParams = source.section("Dummy").unwrap();
        assert_eq!(
            params,
            DummyParams {
                weight: 5.0,
                power: 2
            }
        );
    }

    #[test]
    fn test_section_missing_gives_defaults() {
        let source = ParamSource::from_str("").unwrap();
        assert!(!source.has_section("Dummy"));

        let params: DummyParams = source.section("Dummy").unwrap();
        assert_eq!(params, DummyParams::default());
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let source = ParamSource::from_str("[Dummy]\nweight = 3.0\n").unwrap();

        let params: DummyParams = source.section("Dummy").unwrap();
        assert_eq!(params.weight, 3.0);
        assert_eq!(params.power, 1);
    }
}
