//! Device enumeration and selection on the cpal default host.

use crate::{Error, Result};
use cpal::Device;
use cpal::traits::{DeviceTrait, HostTrait};
use tsunami_core::NATIVE_RATE;

/// Capture or playback side of the duplex pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Input,
    Output,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// Device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Audio device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether the device can capture.
    pub is_input: bool,
    /// Whether the device can play back.
    pub is_output: bool,
    /// The device's preferred sample rate in Hz.
    pub default_sample_rate: u32,
}

fn preferred_rate(device: &Device, direction: Direction) -> u32 {
    let config = match direction {
        Direction::Input => device.default_input_config(),
        Direction::Output => device.default_output_config(),
    };
    config.map(|c| c.sample_rate()).unwrap_or(NATIVE_RATE)
}

fn describe(device: &Device, direction: Direction) -> Option<AudioDevice> {
    let name = device_name(device).ok()?;
    Some(AudioDevice {
        name,
        is_input: direction == Direction::Input,
        is_output: direction == Direction::Output,
        default_sample_rate: preferred_rate(device, direction),
    })
}

/// List capture devices first, then playback-only devices.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices: Vec<AudioDevice> = Vec::new();

    if let Ok(inputs) = host.input_devices() {
        for device in inputs {
            if let Some(mut info) = describe(&device, Direction::Input) {
                info.is_output = device.default_output_config().is_ok();
                devices.push(info);
            }
        }
    }

    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            let Some(info) = describe(&device, Direction::Output) else {
                continue;
            };
            if !devices.iter().any(|d| d.name == info.name) {
                devices.push(info);
            }
        }
    }

    Ok(devices)
}

/// The host's default capture and playback devices, if any.
pub fn default_device() -> Result<(Option<AudioDevice>, Option<AudioDevice>)> {
    let host = cpal::default_host();
    let input = host
        .default_input_device()
        .and_then(|d| describe(&d, Direction::Input));
    let output = host
        .default_output_device()
        .and_then(|d| describe(&d, Direction::Output));
    Ok((input, output))
}

/// Resolve a device selector against a list of names.
///
/// The selector is tried as an index, then as an exact name, then as a
/// case-insensitive substring. Several substring matches pick the first.
pub(crate) fn select_device(
    names: &[String],
    selector: &str,
    direction: Direction,
) -> Result<usize> {
    let kind = direction.label();

    if let Ok(index) = selector.parse::<usize>() {
        return if index < names.len() {
            Ok(index)
        } else {
            Err(Error::DeviceNotFound(format!(
                "{kind} device index {index} (only {} available)",
                names.len()
            )))
        };
    }

    if let Some(index) = names.iter().position(|n| n == selector) {
        return Ok(index);
    }

    let needle = selector.to_lowercase();
    let matches: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, n)| n.to_lowercase().contains(&needle))
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "no {kind} device matching '{selector}'"
        ))),
        [only] => Ok(*only),
        [first, ..] => {
            let candidates: Vec<&str> = matches.iter().map(|&i| names[i].as_str()).collect();
            tracing::warn!(
                search = selector,
                kind,
                ?candidates,
                "multiple devices match, using first"
            );
            Ok(*first)
        }
    }
}

/// Pick a device on `host` by selector, or its default when `selector` is `None`.
pub(crate) fn find_device(
    host: &cpal::Host,
    selector: Option<&str>,
    direction: Direction,
) -> Result<Device> {
    let Some(selector) = selector else {
        let default = match direction {
            Direction::Input => host.default_input_device(),
            Direction::Output => host.default_output_device(),
        };
        return default.ok_or(Error::NoDevice);
    };

    let devices = match direction {
        Direction::Input => host.input_devices(),
        Direction::Output => host.output_devices(),
    };
    let mut devices: Vec<Device> = devices
        .map_err(|e| Error::DeviceUnavailable(e.to_string()))?
        .collect();
    let names: Vec<String> = devices
        .iter()
        .map(|d| device_name(d).unwrap_or_default())
        .collect();

    let index = select_device(&names, selector, direction)?;
    Ok(devices.swap_remove(index))
}
