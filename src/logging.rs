#[cfg(target_arch = "wasm32")]
pub(crate) fn log(s: &str) {
    web_sys::console::log_1(&s.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn log(s: &str) {
    tracing::debug!(target: "arnold_cat_map", "{}", s);
}

macro_rules! console_log {
    ($($t:tt)*) => {
        $crate::logging::log(&format!($($t)*))
    }
}
