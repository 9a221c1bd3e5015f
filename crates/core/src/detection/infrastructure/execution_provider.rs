/// Return the accelerated ONNX execution providers for the current platform.
///
/// ONNX Runtime falls back to CPU when a provider is unavailable at runtime;
/// platforms without an accelerated provider get an empty list.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        log::warn!("No accelerated execution provider on this platform, using CPU");
        vec![]
    }
}
