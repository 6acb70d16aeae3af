//! Demo command set: viewers recolour a virtual light from chat.

use chatcmd::{CommandError, CommandSpec, Dispatcher};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            red: 1.0,
            green: 1.0,
            blue: 1.0,
        }
    }
}

impl Light {
    fn rgb(red: f32, green: f32, blue: f32) -> Self {
        Self {
            red: red.clamp(0.0, 1.0),
            green: green.clamp(0.0, 1.0),
            blue: blue.clamp(0.0, 1.0),
        }
    }
}

fn set_light(light: &Arc<Mutex<Light>>, value: Light) -> Result<(), CommandError> {
    let mut guard = light
        .lock()
        .map_err(|_| CommandError::Failed("light state poisoned".into()))?;
    *guard = value;
    Ok(())
}

fn parse_channel(name: &'static str, value: &str) -> Result<f32, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidArgument {
        name,
        value: value.to_string(),
    })
}

fn solid(
    verb: &str,
    colour_name: &'static str,
    value: Light,
    light: &Arc<Mutex<Light>>,
) -> CommandSpec {
    let light = light.clone();
    CommandSpec::new(verb, move |sender, _| {
        set_light(&light, value)?;
        info!("{} turned the light {}", sender, colour_name);
        Ok(())
    })
    .with_description(format!("Turn the light {}", colour_name))
}

/// Register `!red`, `!green`, `!blue` and `!color` against `light`.
pub fn register(dispatcher: &mut Dispatcher, light: Arc<Mutex<Light>>) {
    dispatcher
        .register(solid("!red", "red", Light::rgb(1.0, 0.0, 0.0), &light))
        .register(solid("!green", "green", Light::rgb(0.0, 1.0, 0.0), &light))
        .register(solid("!blue", "blue", Light::rgb(0.0, 0.0, 1.0), &light));

    let color = CommandSpec::new("!color", move |sender, args| {
        if args.len() < 3 {
            return Err(CommandError::MissingArguments {
                expected: 3,
                got: args.len(),
            });
        }
        let red = parse_channel("red", &args[0])?;
        let green = parse_channel("green", &args[1])?;
        let blue = parse_channel("blue", &args[2])?;
        let value = Light::rgb(red, green, blue);
        set_light(&light, value)?;
        info!(
            "{} turned the light to RGB ({}, {}, {})",
            sender, value.red, value.green, value.blue
        );
        Ok(())
    })
    .with_arguments("<r> <g> <b>")
    .with_description("Set the light to an RGB colour, each channel 0-1");
    dispatcher.register(color);
}
