//! Browser console logging. Off-browser (native unit tests) these are no-ops.

#[cfg(target_arch = "wasm32")]
pub fn info(message: &str) {
    web_sys::console::info_1(&message.into());
}

#[cfg(target_arch = "wasm32")]
pub fn warn(message: &str) {
    web_sys::console::warn_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn info(message: &str) {
    let _ = message;
}

#[cfg(not(target_arch = "wasm32"))]
pub fn warn(message: &str) {
    let _ = message;
}
