//! Binding to the `libtdjson` JSON client interface.

use std::ffi::{CStr, CString, c_char, c_double, c_void};
use std::ptr::NonNull;
use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;

use super::Transport;
use crate::errors::TransportError;

const NATIVE_TARGET: &str = "tdrelay::transport::native";

#[link(name = "tdjson")]
unsafe extern "C" {
    fn td_json_client_create() -> *mut c_void;
    fn td_json_client_send(client: *mut c_void, request: *const c_char);
    fn td_json_client_receive(client: *mut c_void, timeout: c_double) -> *const c_char;
    fn td_json_client_execute(client: *mut c_void, request: *const c_char) -> *const c_char;
    fn td_json_client_destroy(client: *mut c_void);
}

/// A native client instance created through `td_json_client_create`.
///
/// The instance is destroyed when the value is dropped.
pub struct NativeTransport {
    client: NonNull<c_void>,
    // The library forbids concurrent receives and reuses the returned buffer
    // on the next call, so receives are serialised and copied under this lock.
    receive_lock: Mutex<()>,
}

// SAFETY: the JSON client functions may be called from any thread; the one
// exception, concurrent `receive`, is excluded by `receive_lock`.
unsafe impl Send for NativeTransport {}
// SAFETY: see the `Send` implementation.
unsafe impl Sync for NativeTransport {}

impl NativeTransport {
    /// Creates a new native client instance.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Native`] if the library returns a null handle.
    pub fn create() -> Result<Self, TransportError> {
        // SAFETY: no preconditions; a null return is handled below.
        let raw = unsafe { td_json_client_create() };
        let client = NonNull::new(raw).ok_or_else(|| TransportError::Native {
            message: String::from("td_json_client_create returned null"),
        })?;
        debug!(target: NATIVE_TARGET, "native client created");
        Ok(Self {
            client,
            receive_lock: Mutex::new(()),
        })
    }
}

fn to_c_string(payload: &[u8]) -> Result<CString, TransportError> {
    CString::new(payload).map_err(|error| TransportError::InteriorNul {
        offset: error.nul_position(),
    })
}

/// Copies a library-owned string before the library reuses its buffer.
///
/// # Safety
///
/// `raw` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
unsafe fn copy_result(raw: *const c_char) -> Option<Vec<u8>> {
    if raw.is_null() {
        return None;
    }
    // SAFETY: guaranteed by the caller.
    let bytes = unsafe { CStr::from_ptr(raw) }.to_bytes().to_vec();
    Some(bytes)
}

impl Transport for NativeTransport {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        let request = to_c_string(payload)?;
        // SAFETY: `client` is live until drop and `request` outlives the call.
        unsafe { td_json_client_send(self.client.as_ptr(), request.as_ptr()) };
        Ok(())
    }

    fn receive(&self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        let _guard = self
            .receive_lock
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        // SAFETY: `client` is live and receives are serialised by `_guard`; the
        // result is copied before the lock is released.
        let payload = unsafe {
            let raw = td_json_client_receive(self.client.as_ptr(), timeout.as_secs_f64());
            copy_result(raw)
        };
        Ok(payload)
    }

    fn execute(&self, payload: &[u8]) -> Result<Option<Vec<u8>>, TransportError> {
        let request = to_c_string(payload)?;
        // SAFETY: `client` is live; the result is valid until the next execute
        // on this thread and is copied immediately.
        let result = unsafe {
            let raw = td_json_client_execute(self.client.as_ptr(), request.as_ptr());
            copy_result(raw)
        };
        Ok(result)
    }
}

impl Drop for NativeTransport {
    fn drop(&mut self) {
        // SAFETY: the handle came from `td_json_client_create` and is not used
        // after this point.
        unsafe { td_json_client_destroy(self.client.as_ptr()) };
        debug!(target: NATIVE_TARGET, "native client destroyed");
    }
}

impl std::fmt::Debug for NativeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeTransport")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
