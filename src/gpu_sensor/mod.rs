// Always built so its process handling stays under test; the stub wins when both are enabled.
#[cfg_attr(
    not(all(feature = "gpu-sensor-nvidia-smi", not(feature = "gpu-sensor-stub"))),
    allow(dead_code)
)]
mod nvidia_smi;
#[cfg(all(feature = "gpu-sensor-nvidia-smi", not(feature = "gpu-sensor-stub")))]
pub use nvidia_smi::NvidiaSmi as GpuSensor;

#[cfg(feature = "gpu-sensor-stub")]
mod stub;
#[cfg(feature = "gpu-sensor-stub")]
pub use stub::GpuSensorStub as GpuSensor;

#[cfg(not(any(feature = "gpu-sensor-nvidia-smi", feature = "gpu-sensor-stub")))]
compile_error!("enable one GPU sensor backend: `gpu-sensor-nvidia-smi` or `gpu-sensor-stub`");

/// A source of GPU temperature samples in degrees Celsius.
///
/// A failed read is an expected outcome and yields `None`; implementations
/// log the cause themselves.
pub trait ReadTemperature {
    fn read(&self) -> Option<i32>;
}

/// Picks the temperature out of diagnostic tool output.
///
/// The first line that is a bare integer wins, so an optional header line
/// ahead of the value is skipped.
pub fn parse_temperature(output: &str) -> Option<i32> {
    output
        .lines()
        .map(str::trim)
        .find_map(|line| line.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_value() {
        assert_eq!(parse_temperature("62\n"), Some(62));
        assert_eq!(parse_temperature("  -5  "), Some(-5));
        assert_eq!(parse_temperature("0"), Some(0));
    }

    #[test]
    fn skips_header_line() {
        assert_eq!(parse_temperature("temperature.gpu\n71\n"), Some(71));
    }

    #[cfg(all(feature = "gpu-sensor-nvidia-smi", not(feature = "gpu-sensor-stub")))]
    #[test]
    fn default_backend_runs_the_configured_command() {
        let sensor = GpuSensor::new(std::path::Path::new("/nonexistent/bin/nvidia-smi"));

        assert_eq!(sensor.read(), None);
    }

    #[cfg(feature = "gpu-sensor-stub")]
    #[test]
    fn stub_backend_ignores_the_command() {
        let sensor = GpuSensor::new(std::path::Path::new("/nonexistent/bin/nvidia-smi"));

        assert!(sensor.read().is_some());
    }

    #[test]
    fn malformed_output_is_absent() {
        for output in ["", "\n\n", "[N/A]", "temperature.gpu", "62 C", "6.5", "99999999999"] {
            assert_eq!(parse_temperature(output), None, "{output:?}");
        }
    }
}
