//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements        | Connects to               |
//! |------------|-------------------|---------------------------|
//! | `hardware` | TemperaturePort   | PT1000 on ESP32 ADC       |
//! |            | BrewLeverPort     | lever GPIO                |
//! |            | ButtonPort        | button ISR latch / GPIO   |
//! |            | ActuatorPort      | SSR GPIOs, status LED     |
//! | `console`  | CommandPort       | Serial console UART       |
//! | `log_sink` | EventSink         | Serial log output         |
//! | `nvs`      | StoragePort       | NVS / in-memory store     |
//! | `params`   | ParameterPort     | any StoragePort           |
//! | `time`     | ClockPort         | ESP32 system timer        |

pub mod console;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod params;
pub mod time;
