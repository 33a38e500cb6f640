//! Run configuration.
use std::{fs, path::Path};

use chip8::prelude::*;
use serde::Deserialize;

use crate::{clock::Hz, error::CliError};

/// Settings for a headless run, usually loaded from a YAML file.
///
/// ```yaml
/// clock_frequency: 700
/// cycles: 20000
/// seed: 42
/// input:
///   - { cycle: 100, key: 5, pressed: true }
///   - { cycle: 110, key: 5, pressed: false }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConf {
    /// Instructions executed per second.
    pub clock_frequency: Hz,
    /// Number of steps before the run stops.
    pub cycles: u64,
    /// Pace the machine against the wall clock. When off, the
    /// machine runs as fast as possible and timers are counted
    /// down by cycle count.
    pub throttle: bool,
    pub seed: Option<u64>,
    /// Scripted keypad events.
    pub input: Vec<KeyEvent>,
}

impl Default for RunConf {
    fn default() -> Self {
        Self {
            clock_frequency: Hz(700),
            cycles: 10_000,
            throttle: true,
            seed: None,
            input: vec![],
        }
    }
}

impl RunConf {
    pub fn load(filepath: impl AsRef<Path>) -> Result<Self, CliError> {
        let file = fs::File::open(filepath.as_ref())?;
        let conf: RunConf = serde_yaml::from_reader(file)?;
        log::debug!("loaded run config: {:#?}", conf);
        Ok(conf)
    }

    pub fn vm_conf(&self) -> Chip8Conf {
        Chip8Conf { seed: self.seed }
    }

    /// Scripted input ordered by the cycle it fires on.
    pub fn sorted_input(&self) -> Vec<KeyEvent> {
        let mut events = self.input.clone();
        events.sort_by_key(|event| event.cycle);
        events
    }
}

/// Key state change applied before the given cycle is stepped.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct KeyEvent {
    pub cycle: u64,
    pub key: KeyCode,
    pub pressed: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
clock_frequency: 500
seed: 7
input:
  - { cycle: 30, key: 10, pressed: false }
  - { cycle: 10, key: 10, pressed: true }
"#;
        let conf: RunConf = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(conf.clock_frequency, Hz(500));
        assert_eq!(conf.cycles, 10_000);
        assert!(conf.throttle);
        assert_eq!(conf.vm_conf().seed, Some(7));

        let input = conf.sorted_input();
        assert_eq!(input[0].cycle, 10);
        assert_eq!(input[0].key, KeyCode::KeyA);
        assert!(input[0].pressed);
        assert_eq!(input[1].cycle, 30);
    }

    #[test]
    fn test_reject_invalid_key() {
        let yaml = "input: [{ cycle: 0, key: 16, pressed: true }]";
        assert!(serde_yaml::from_str::<RunConf>(yaml).is_err());
    }
}
