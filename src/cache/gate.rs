use tracing::{debug, warn};

use super::host::InboundRequest;
use crate::http::Method;

/// Read-path policy: should this request consult the cache at all?
///
/// Only `GET` requests without a `Cache-Control: no-cache` directive are
/// eligible. If the host cannot report the method or headers, the answer is
/// no, so a broken accessor can only ever cost an upstream round trip.
pub fn should_lookup<R: InboundRequest + ?Sized>(request: &R) -> bool {
    match request.method() {
        Ok(Method::Get) => {}
        Ok(_) => return false,
        Err(e) => {
            warn!(error = %e, "failed to get request method");
            return false;
        }
    }

    match request.header("Cache-Control") {
        Ok(Some(value)) if has_no_cache(&value) => {
            debug!("request asked for no-cache, bypassing lookup");
            false
        }
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "failed to read Cache-Control");
            false
        }
    }
}

fn has_no_cache(value: &str) -> bool {
    value
        .split(',')
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
}
