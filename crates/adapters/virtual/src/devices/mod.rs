//! Virtual devices: sensor and button publish signals, light and fan are
//! driven by actions.

mod button;
mod fan;
mod light;
mod sensor;

pub use button::VirtualButton;
pub use fan::VirtualFan;
pub use light::VirtualLight;
pub use sensor::VirtualSensor;
