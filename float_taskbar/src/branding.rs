pub const APP_DISPLAY_NAME: &str = "Float Taskbar";
pub const APP_ID: &str = "float_taskbar";
