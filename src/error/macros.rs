//! # 错误处理宏

/// 快速创建配置错误的宏
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::AppError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::AppError::config(format!($fmt, $($arg)*))
    };
}

/// 快速创建内部错误的宏
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::error::AppError::internal($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::AppError::internal(format!($fmt, $($arg)*))
    };
}

/// 快速创建字段校验错误的宏
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $msg:expr) => {
        $crate::error::AppError::validation($msg, Some($field.to_string()))
    };
    ($field:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::AppError::validation(format!($fmt, $($arg)*), Some($field.to_string()))
    };
}

/// 确保条件成立，否则返回配置错误
#[macro_export]
macro_rules! ensure_config {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::config_error!($msg));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::config_error!($fmt, $($arg)*));
        }
    };
}
