//! OS location permission probe and prompt.

use super::{PermissionStatus, PlatformError};
use async_trait::async_trait;
use std::sync::Arc;

/// Platform permission capability.
#[async_trait]
pub trait LocationPermissionApi: Send + Sync {
    /// Reads the current permission without prompting.
    async fn check(&self) -> Result<PermissionStatus, PlatformError>;

    /// Shows the OS permission dialog and returns the user's answer.
    async fn request(&self) -> Result<PermissionStatus, PlatformError>;
}

/// Fail-safe wrapper around [`LocationPermissionApi`].
///
/// Platform errors never propagate: they are logged at `warn` and reported as
/// [`PermissionStatus::Undetermined`], which leads the state machine back to
/// the allow/skip prompt instead of a hard failure.
#[derive(Clone)]
pub struct PermissionGate {
    api: Arc<dyn LocationPermissionApi>,
}

impl PermissionGate {
    pub fn new(api: Arc<dyn LocationPermissionApi>) -> Self {
        Self { api }
    }

    /// Probes the current permission. Never prompts.
    pub async fn check(&self) -> PermissionStatus {
        match self.api.check().await {
            Ok(status) => {
                tracing::debug!(?status, "permission checked");
                status
            }
            Err(e) => {
                tracing::warn!(error = %e, "permission check failed, treating as undetermined");
                PermissionStatus::Undetermined
            }
        }
    }

    /// Prompts for permission unless it is already decided.
    ///
    /// A decided status is returned as-is without showing the dialog.
    /// Otherwise the platform prompt is shown exactly once.
    pub async fn request(&self) -> PermissionStatus {
        let current = self.check().await;
        if current.is_decided() {
            tracing::debug!(status = ?current, "permission already decided, not prompting");
            return current;
        }

        match self.api.request().await {
            Ok(status) => {
                tracing::info!(?status, "permission prompt answered");
                status
            }
            Err(e) => {
                tracing::warn!(error = %e, "permission request failed, treating as undetermined");
                PermissionStatus::Undetermined
            }
        }
    }
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedApi {
        current: Mutex<Result<PermissionStatus, PlatformError>>,
        answer: Result<PermissionStatus, PlatformError>,
        prompts: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(
            current: Result<PermissionStatus, PlatformError>,
            answer: Result<PermissionStatus, PlatformError>,
        ) -> Arc<Self> {
            Arc::new(Self {
                current: Mutex::new(current),
                answer,
                prompts: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LocationPermissionApi for ScriptedApi {
        async fn check(&self) -> Result<PermissionStatus, PlatformError> {
            self.current.lock().unwrap().clone()
        }

        async fn request(&self) -> Result<PermissionStatus, PlatformError> {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            let answer = self.answer.clone();
            if let Ok(status) = &answer {
                *self.current.lock().unwrap() = Ok(*status);
            }
            answer
        }
    }

    #[tokio::test]
    async fn check_errors_become_undetermined() {
        let api = ScriptedApi::new(
            Err(PlatformError::new(2, "service crashed")),
            Ok(PermissionStatus::Granted),
        );
        let gate = PermissionGate::new(api.clone());

        assert_eq!(gate.check().await, PermissionStatus::Undetermined);
        assert_eq!(api.prompts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn decided_status_is_returned_without_prompt() {
        let api = ScriptedApi::new(Ok(PermissionStatus::Denied), Ok(PermissionStatus::Granted));
        let gate = PermissionGate::new(api.clone());

        assert_eq!(gate.request().await, PermissionStatus::Denied);
        assert_eq!(api.prompts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn undetermined_prompts_once() {
        let api = ScriptedApi::new(
            Ok(PermissionStatus::Undetermined),
            Ok(PermissionStatus::Granted),
        );
        let gate = PermissionGate::new(api.clone());

        assert_eq!(gate.request().await, PermissionStatus::Granted);
        assert_eq!(gate.request().await, PermissionStatus::Granted);
        assert_eq!(api.prompts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn prompt_error_is_undetermined() {
        let api = ScriptedApi::new(
            Ok(PermissionStatus::Undetermined),
            Err(PlatformError::new(0, "activity gone")),
        );
        let gate = PermissionGate::new(api);

        assert_eq!(gate.request().await, PermissionStatus::Undetermined);
    }
}
