pub mod data_log;
pub mod events;
pub mod fridge;
pub mod status;

pub use data_log::DataLog;
pub use events::{AlertEvent, LogEntry, Severity};
pub use fridge::{
    BatteryHealth, FaultKind, FridgeState, History, InvariantError, PowerSource, TempTrend,
    HISTORY_DAYS,
};
pub use status::{
    BatteryRuntime, ConnectionStatus, ExportSummary, PowerMode, StatusReport, SystemStatusBlock,
};
