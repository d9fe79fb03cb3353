use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{parse_temperature, ReadTemperature};

/// Reads the GPU core temperature by running `nvidia-smi`.
#[derive(Debug, Clone)]
pub struct NvidiaSmi {
    program: PathBuf,
    args: Vec<OsString>,
}

impl NvidiaSmi {
    const QUERY_ARGS: [&'static str; 2] =
        ["--query-gpu=temperature.gpu", "--format=csv,noheader"];

    pub fn new(program: &Path) -> NvidiaSmi {
        Self::with_args(program, Self::QUERY_ARGS)
    }

    pub fn with_args<I, A>(program: impl Into<PathBuf>, args: I) -> NvidiaSmi
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        NvidiaSmi {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl ReadTemperature for NvidiaSmi {
    fn read(&self) -> Option<i32> {
        log::debug!("Running {:?} {:?}", self.program, self.args);

        let output = match Command::new(&self.program).args(&self.args).output() {
            Ok(output) => output,
            Err(err) => {
                log::warn!("Could not run {}: {err}", self.program.display());
                return None;
            }
        };

        if !output.status.success() {
            log::warn!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        log::debug!("{} output: {:?}", self.program.display(), stdout);

        let temperature = parse_temperature(&stdout);
        if temperature.is_none() {
            log::warn!(
                "No temperature in {} output {:?}",
                self.program.display(),
                stdout.trim()
            );
        }

        temperature
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> NvidiaSmi {
        NvidiaSmi::with_args("sh", ["-c", script])
    }

    #[test]
    fn reads_value_from_stdout() {
        assert_eq!(shell("echo 62").read(), Some(62));
    }

    #[test]
    fn reads_value_after_header() {
        assert_eq!(shell("echo temperature.gpu; echo 71").read(), Some(71));
    }

    #[test]
    fn non_zero_exit_is_absent() {
        assert_eq!(shell("echo 62; exit 3").read(), None);
    }

    #[test]
    fn non_numeric_or_empty_output_is_absent() {
        assert_eq!(shell("echo '[N/A]'").read(), None);
        assert_eq!(shell("true").read(), None);
    }

    #[test]
    fn missing_tool_is_absent() {
        let sensor = NvidiaSmi::new(Path::new("/nonexistent/bin/nvidia-smi"));

        assert_eq!(sensor.read(), None);
    }
}
