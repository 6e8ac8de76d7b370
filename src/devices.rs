use cpal::traits::{DeviceTrait, HostTrait};

use crate::error::AudioDeviceError;

/// Which side of the host a device is opened on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

fn device_name(device: &cpal::Device) -> Option<String> {
    device.description().ok().map(|desc| desc.name().to_string())
}

/// List available audio devices for one direction
pub fn list_devices(direction: Direction) -> Result<Vec<String>, AudioDeviceError> {
    let host = cpal::default_host();

    let mut devices: Vec<String> = match direction {
        Direction::Input => host
            .input_devices()
            .map_err(|e| AudioDeviceError::Enumerate(e.to_string()))?
            .filter_map(|device| device_name(&device))
            .collect(),
        Direction::Output => host
            .output_devices()
            .map_err(|e| AudioDeviceError::Enumerate(e.to_string()))?
            .filter_map(|device| device_name(&device))
            .collect(),
    };

    // Also try to get the default device explicitly
    let default_device = match direction {
        Direction::Input => host.default_input_device(),
        Direction::Output => host.default_output_device(),
    };
    if let Some(name) = default_device.as_ref().and_then(device_name) {
        if !devices.contains(&name) {
            devices.push(name);
        }
    }

    Ok(devices)
}

/// Find device index by name or index string
pub fn find_device(devices: &[String], search: &str) -> Result<usize, AudioDeviceError> {
    // Try to parse as index first
    if let Ok(index) = search.parse::<usize>() {
        if index < devices.len() {
            return Ok(index);
        }
        return Err(AudioDeviceError::IndexOutOfRange {
            index,
            last: devices.len().saturating_sub(1),
        });
    }

    // Search by name (case-insensitive substring match)
    let search_lower = search.to_lowercase();
    devices
        .iter()
        .position(|device| device.to_lowercase().contains(&search_lower))
        .ok_or_else(|| AudioDeviceError::DeviceNotFound(search.to_string()))
}

/// Open the configured device, or the host default when `search` is None
pub fn open_device(
    direction: Direction,
    search: Option<&str>,
) -> Result<cpal::Device, AudioDeviceError> {
    let host = cpal::default_host();

    let Some(search) = search else {
        let device = match direction {
            Direction::Input => host.default_input_device(),
            Direction::Output => host.default_output_device(),
        };
        return device.ok_or(AudioDeviceError::NoDevice(direction.label()));
    };

    let names = list_devices(direction)?;
    let wanted = &names[find_device(&names, search)?];

    let mut candidates: Box<dyn Iterator<Item = cpal::Device>> = match direction {
        Direction::Input => Box::new(
            host.input_devices()
                .map_err(|e| AudioDeviceError::Enumerate(e.to_string()))?,
        ),
        Direction::Output => Box::new(
            host.output_devices()
                .map_err(|e| AudioDeviceError::Enumerate(e.to_string()))?,
        ),
    };

    candidates
        .find(|device| device_name(device).as_deref() == Some(wanted.as_str()))
        .ok_or_else(|| AudioDeviceError::DeviceNotFound(search.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec![
            "Built-in Microphone".to_string(),
            "USB Audio CODEC".to_string(),
            "Loopback".to_string(),
        ]
    }

    #[test]
    fn test_find_by_index() {
        assert_eq!(find_device(&names(), "1").unwrap(), 1);
        assert!(matches!(
            find_device(&names(), "7"),
            Err(AudioDeviceError::IndexOutOfRange { index: 7, last: 2 })
        ));
    }

    #[test]
    fn test_find_by_name_substring() {
        assert_eq!(find_device(&names(), "usb").unwrap(), 1);
        assert_eq!(find_device(&names(), "MICRO").unwrap(), 0);
        assert!(matches!(
            find_device(&names(), "headset"),
            Err(AudioDeviceError::DeviceNotFound(_))
        ));
    }
}
