//! One request/response exchange on an open session.
//!
//! `send_request` hands the request to the session and waits for it to go
//! out. `receive_response` then reads the response into the scratch window
//! until the body is complete:
//!
//! ```text
//! AwaitHeaders ──redirect──> target rewritten, NeedRepeat
//!      │
//!      └──────> ParsingBody ──complete / stream end──> done
//! ```

use tracing::{debug, error, info, warn};

use super::context::{DownloadContext, RequestStatus};
use super::redirect::resolve_location;
use super::transport::{Operation, ResponseMessage, Transport};
use super::wait::{wait_for_completion, Completion, InFlight, WaitOutcome};
use crate::error::{NetworkError, Result};
use crate::http::status::{describe, is_error, is_redirection};
use crate::http::Request;
use crate::time::TimerSource;
use crate::transfer::BodyParser;
use crate::types::HttpMethod;
use crate::utils::buffer::ScratchBuffer;

/// Submit `request` and wait until it has been sent.
///
/// The request is cancelled on submission failure or timeout.
pub fn send_request<T, C>(session: &mut T, clock: &mut C, request: &Request, wait_ms: u64) -> Result<()>
where
    T: Transport + ?Sized,
    C: TimerSource,
{
    debug!("{} ({} headers)", request.request_line(), request.headers().len());

    let completion = Completion::new();
    let mut op = InFlight::new(session, Operation::Request);
    // SAFETY: `completion` is declared before the guard and outlives it; the
    // guard finishes or cancels the request before returning.
    unsafe { op.transport().submit_request(request, &completion) }?;

    wait_for_completion(&mut op, clock, &completion, wait_ms, false)?;
    op.finish()
}

/// Receive the response to the request just sent.
///
/// On a redirect the context's target is rewritten and its status set to
/// `NeedRepeat`. Otherwise the body is copied into the destination through
/// `ctx.progress`; an error status is recorded in `ctx.status` while the
/// body is still collected.
///
/// # Errors
///
/// - `NotFound` for a redirect without `Location`
/// - `RecursiveRedirect` for a redirect back to the requested URL
/// - `BufferTooSmall` when a HEAD probe reports more than the destination
///   holds
/// - `InvalidResponse` for unparseable framing
/// - transport and timeout errors from the reads
pub fn receive_response<T, C>(
    session: &mut T,
    clock: &mut C,
    ctx: &mut DownloadContext<'_, '_>,
    scratch: &mut ScratchBuffer,
    wait_ms: u64,
) -> Result<()>
where
    T: Transport + ?Sized,
    C: TimerSource,
{
    let requested = ctx.target.full_url()?;
    let window_len = match ctx.method {
        HttpMethod::Head => 0,
        HttpMethod::Get => scratch.len(),
    };
    let mut parser: Option<BodyParser> = None;

    loop {
        let want_headers = parser.is_none();
        let stop_on_redirect = ctx.progress.downloaded() == 0;
        let message = read_once(
            session,
            clock,
            scratch,
            window_len,
            want_headers,
            stop_on_redirect,
            wait_ms,
        )?;

        if parser.is_none() {
            match start_body(ctx, &message, requested.as_str())? {
                Some(started) => parser = Some(started),
                None => return Ok(()),
            }
        }
        let Some(body) = parser.as_mut() else {
            return Err(NetworkError::InvalidResponse);
        };

        let received = message.body_length.min(window_len);
        if received == 0 && !want_headers {
            body.finish_stream();
            if !body.is_complete() {
                warn!("Connection closed after {} body bytes", body.consumed());
            }
            break;
        }

        let progress = &mut ctx.progress;
        body.feed(scratch.window(received), |fragment| progress.save_portion(fragment))?;
        if body.is_complete() {
            break;
        }
    }

    debug!(
        "response complete, {} bytes stored of {}",
        ctx.progress.downloaded(),
        ctx.progress.content_length()
    );
    Ok(())
}

/// Submit one response read and collect what it produced.
///
/// A read that fails or times out after the headers arrived still counts:
/// the headers are enough to go on.
fn read_once<T, C>(
    session: &mut T,
    clock: &mut C,
    scratch: &mut ScratchBuffer,
    window_len: usize,
    want_headers: bool,
    stop_on_redirect: bool,
    wait_ms: u64,
) -> Result<ResponseMessage>
where
    T: Transport + ?Sized,
    C: TimerSource,
{
    let completion = Completion::new();
    let mut op = InFlight::new(session, Operation::Response);
    // SAFETY: `completion` outlives the guard, and `scratch` stays borrowed
    // by this function until the guard has finished or cancelled the read.
    unsafe {
        op.transport()
            .submit_response(scratch.window_mut(window_len), want_headers, &completion)
    }?;

    let waited = wait_for_completion(&mut op, clock, &completion, wait_ms, stop_on_redirect);
    let message = op.transport().take_response();

    match waited {
        Ok(WaitOutcome::Completed) => {
            let status = op.finish();
            let message = message?;
            match status {
                Ok(()) => Ok(message),
                Err(e) if message.has_headers() => {
                    debug!("read reported '{}' after headers arrived, continuing", e);
                    Ok(message)
                }
                Err(e) => Err(e),
            }
        }
        Ok(WaitOutcome::RedirectPending) => {
            op.cancel();
            message
        }
        Err(e) => {
            op.cancel();
            match message {
                Ok(message) if message.has_headers() => {
                    debug!("read ended with '{}' after headers arrived, continuing", e);
                    Ok(message)
                }
                _ => Err(e),
            }
        }
    }
}

/// Handle the header read: redirect, probe check or body parser setup.
///
/// Returns `None` when the exchange ends in a redirect.
fn start_body(
    ctx: &mut DownloadContext<'_, '_>,
    message: &ResponseMessage,
    requested_url: &str,
) -> Result<Option<BodyParser>> {
    let code = message.status_code.ok_or(NetworkError::InvalidResponse)?;
    debug!("HTTP {} with {} headers", code, message.headers.len());

    if is_redirection(code) {
        let location = message.headers.location().ok_or(NetworkError::NotFound)?;
        info!("HTTP {} redirect to {}", code, location);
        if let Err(e) = resolve_location(location, &mut ctx.target, requested_url) {
            if e == NetworkError::RecursiveRedirect {
                warn!(
                    "{} reports recursive relocation for {}",
                    ctx.target.server_and_scheme(),
                    ctx.target.uri()
                );
            }
            return Err(e);
        }
        ctx.status = RequestStatus::NeedRepeat;
        return Ok(None);
    }

    let parser = BodyParser::new(ctx.method, code, &message.headers);
    ctx.entity_length = parser.entity_length();
    let entity_length = ctx.entity_length.unwrap_or(0);
    debug!("entity length {}", entity_length);

    match ctx.method {
        HttpMethod::Head => {
            if entity_length > ctx.progress.capacity() {
                info!("Probe: {} bytes required", entity_length);
                return Err(NetworkError::BufferTooSmall {
                    required: entity_length,
                });
            }
        }
        HttpMethod::Get => ctx.progress.set_content_length(entity_length),
    }

    if is_error(code) && ctx.record_http_error(code) {
        error!(
            "{} reports '{}' for {}",
            ctx.target.server_and_scheme(),
            describe(code),
            ctx.target.uri()
        );
    }

    Ok(Some(parser))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::{InterfaceProvider, SessionConfig};
    use crate::mock::{MockNetwork, MockNic, PollClock, Reply, ScriptedResponse};
    use crate::transfer::Progress;
    use crate::url::UrlParts;
    use alloc::vec;
    use alloc::vec::Vec;
    use tracing_test::traced_test;

    fn network(responses: Vec<ScriptedResponse>) -> MockNetwork {
        let mut nic = MockNic::ethernet();
        for response in responses {
            nic = nic.respond(response);
        }
        MockNetwork::new().with_nic(nic)
    }

    fn exchange(
        network: &mut MockNetwork,
        ctx: &mut DownloadContext<'_, '_>,
        scratch_len: usize,
    ) -> Result<()> {
        let mut clock = PollClock::new(50);
        let nic = network.interfaces()?.remove(0);
        let mut session = network.open_session(&nic)?;
        session.configure(&SessionConfig::default())?;
        let request = Request::build(ctx.method, &ctx.target, "test-agent")?;
        let mut scratch = ScratchBuffer::allocate(scratch_len)?;
        send_request(&mut session, &mut clock, &request, 10_000)?;
        receive_response(&mut session, &mut clock, ctx, &mut scratch, 10_000)
    }

    fn context<'d>(url: &str, dest: &'d mut [u8]) -> DownloadContext<'d, 'static> {
        DownloadContext::new(UrlParts::compose(url).unwrap(), Progress::new(dest, None))
    }

    // ==================== Body Framing ====================

    #[test]
    fn test_length_delimited_over_several_reads() {
        let mut net = network(vec![ScriptedResponse::ok(b"0123456789").read_size(3)]);
        let mut dest = [0u8; 16];
        let mut ctx = context("http://h/f", &mut dest);

        exchange(&mut net, &mut ctx, 4).unwrap();
        assert_eq!(ctx.status, RequestStatus::Ok);
        assert_eq!(ctx.progress.downloaded(), 10);
        assert_eq!(ctx.progress.content_length(), 10);
        drop(ctx);
        assert_eq!(&dest[..10], b"0123456789");

        let journal = net.journal();
        assert!(journal.reads[0].want_headers);
        assert!(journal.reads[1..].iter().all(|r| !r.want_headers));
        assert!(journal.cancels.is_empty());
    }

    #[test]
    fn test_chunked_body() {
        let mut net = network(vec![
            ScriptedResponse::chunked(&[b"Wiki", b"pedia", b" in chunks"]).read_size(5)
        ]);
        let mut dest = [0u8; 32];
        let mut ctx = context("http://h/f", &mut dest);

        exchange(&mut net, &mut ctx, 8).unwrap();
        let downloaded = ctx.progress.downloaded();
        assert_eq!(ctx.progress.content_length(), 0);
        drop(ctx);
        assert_eq!(&dest[..downloaded], b"Wikipedia in chunks");
    }

    #[test]
    fn test_streamed_body_ends_on_empty_read() {
        let mut net = network(vec![ScriptedResponse::streamed(b"until close").read_size(4)]);
        let mut dest = [0u8; 32];
        let mut ctx = context("http://h/f", &mut dest);

        exchange(&mut net, &mut ctx, 16).unwrap();
        let downloaded = ctx.progress.downloaded();
        drop(ctx);
        assert_eq!(&dest[..downloaded], b"until close");
    }

    #[test]
    fn test_body_larger_than_destination() {
        let mut net = network(vec![ScriptedResponse::ok(b"abcdefghij")]);
        let mut dest = [0u8; 4];
        let mut ctx = context("http://h/f", &mut dest);

        exchange(&mut net, &mut ctx, 64).unwrap();
        assert_eq!(ctx.progress.downloaded(), 4);
        drop(ctx);
        assert_eq!(&dest, b"abcd");
    }

    #[test]
    fn test_read_error_after_headers_is_tolerated() {
        let mut net = network(vec![
            ScriptedResponse::ok(b"abc").read_status(NetworkError::ReceiveFailed)
        ]);
        let mut dest = [0u8; 8];
        let mut ctx = context("http://h/f", &mut dest);

        exchange(&mut net, &mut ctx, 64).unwrap();
        assert_eq!(ctx.progress.downloaded(), 3);
    }

    #[test]
    fn test_silent_response_times_out() {
        let mut net = network(vec![ScriptedResponse::ok(b"abc").stall_after(0)]);
        let mut dest = [0u8; 8];
        let mut ctx = context("http://h/f", &mut dest);

        assert_eq!(exchange(&mut net, &mut ctx, 64), Err(NetworkError::Timeout));
        assert_eq!(ctx.progress.downloaded(), 0);
        let journal = net.journal();
        assert_eq!(journal.reads.len(), 1);
        assert_eq!(journal.cancels, [Operation::Response]);
    }

    #[test]
    fn test_body_stalling_midway_times_out() {
        let mut net = network(vec![ScriptedResponse::ok(b"abcdef").stall_after(3)]);
        let mut dest = [0u8; 8];
        let mut ctx = context("http://h/f", &mut dest);

        assert_eq!(exchange(&mut net, &mut ctx, 64), Err(NetworkError::Timeout));
        assert_eq!(ctx.progress.downloaded(), 3);
        drop(ctx);
        assert_eq!(&dest[..3], b"abc");
        let journal = net.journal();
        assert_eq!(journal.reads.len(), 2);
        assert!(!journal.reads[1].want_headers);
        assert_eq!(journal.cancels, [Operation::Response]);
    }

    #[test]
    fn test_unsent_request_times_out() {
        let mut net = MockNetwork::new().with_nic(MockNic::ethernet().reply(Reply::Stall));
        let mut dest = [0u8; 8];
        let mut ctx = context("http://h/f", &mut dest);

        assert_eq!(exchange(&mut net, &mut ctx, 64), Err(NetworkError::Timeout));
        assert_eq!(net.journal().cancels, [Operation::Request]);
    }

    // ==================== Error Statuses ====================

    #[test]
    #[traced_test]
    fn test_error_status_keeps_body() {
        let mut net = network(vec![ScriptedResponse::error(404, b"no such file")]);
        let mut dest = [0u8; 32];
        let mut ctx = context("http://h/missing", &mut dest);

        exchange(&mut net, &mut ctx, 64).unwrap();
        assert_eq!(ctx.status, RequestStatus::HttpError(404));
        let downloaded = ctx.progress.downloaded();
        drop(ctx);
        assert_eq!(&dest[..downloaded], b"no such file");
        assert!(logs_contain("404 Not Found"));
    }

    #[test]
    #[traced_test]
    fn test_unlisted_error_status() {
        let mut net = network(vec![ScriptedResponse::error(418, b"")]);
        let mut dest = [0u8; 32];
        let mut ctx = context("http://h/tea", &mut dest);

        exchange(&mut net, &mut ctx, 64).unwrap();
        assert_eq!(ctx.status, RequestStatus::HttpError(418));
        assert!(logs_contain("Unclassified error"));
    }

    // ==================== Redirects ====================

    #[test]
    fn test_redirect_rewrites_target() {
        let mut net = network(vec![ScriptedResponse::redirect(302, "http://h2/p3")]);
        let mut dest = [0u8; 8];
        let mut ctx = context("http://h/p1", &mut dest);

        exchange(&mut net, &mut ctx, 64).unwrap();
        assert_eq!(ctx.status, RequestStatus::NeedRepeat);
        assert_eq!(ctx.target.server_and_scheme(), "http://h2");
        assert_eq!(ctx.target.uri(), "/p3");
        assert_eq!(ctx.progress.downloaded(), 0);
    }

    #[test]
    fn test_hanging_redirect_is_cancelled() {
        let mut net = network(vec![ScriptedResponse::redirect(301, "/moved").hang()]);
        let mut dest = [0u8; 8];
        let mut ctx = context("http://h/p1", &mut dest);

        exchange(&mut net, &mut ctx, 64).unwrap();
        assert_eq!(ctx.status, RequestStatus::NeedRepeat);
        assert_eq!(ctx.target.uri(), "/moved");
        assert_eq!(net.journal().cancels, [Operation::Response]);
    }

    #[test]
    fn test_redirect_without_location() {
        let mut net = network(vec![ScriptedResponse::new(302)]);
        let mut dest = [0u8; 8];
        let mut ctx = context("http://h/p1", &mut dest);

        assert_eq!(exchange(&mut net, &mut ctx, 64), Err(NetworkError::NotFound));
    }

    #[test]
    #[traced_test]
    fn test_redirect_to_self() {
        let mut net = network(vec![ScriptedResponse::redirect(307, "http://h/p")]);
        let mut dest = [0u8; 8];
        let mut ctx = context("http://h/p", &mut dest);

        assert_eq!(
            exchange(&mut net, &mut ctx, 64),
            Err(NetworkError::RecursiveRedirect)
        );
        assert!(logs_contain("recursive relocation"));
    }

    // ==================== Probe ====================

    #[test]
    fn test_head_probe_reports_required_size() {
        let mut net = network(vec![ScriptedResponse::probe(5000)]);
        let mut dest: [u8; 0] = [];
        let mut ctx = context("http://h/big.bin", &mut dest);
        assert_eq!(ctx.method, HttpMethod::Head);

        assert_eq!(
            exchange(&mut net, &mut ctx, 64),
            Err(NetworkError::BufferTooSmall { required: 5000 })
        );
        assert_eq!(net.journal().reads[0].window_len, 0);
    }

    #[test]
    fn test_head_probe_empty_entity() {
        let mut net = network(vec![ScriptedResponse::probe(0)]);
        let mut dest: [u8; 0] = [];
        let mut ctx = context("http://h/empty", &mut dest);

        exchange(&mut net, &mut ctx, 64).unwrap();
        assert_eq!(ctx.status, RequestStatus::Ok);
        assert_eq!(ctx.entity_length, Some(0));
        assert_eq!(net.journal().reads.len(), 1);
    }

    #[test]
    fn test_head_probe_without_length() {
        let mut net = network(vec![ScriptedResponse::new(200)]);
        let mut dest: [u8; 0] = [];
        let mut ctx = context("http://h/unknown", &mut dest);

        exchange(&mut net, &mut ctx, 64).unwrap();
        assert_eq!(ctx.entity_length, None);
    }

    // ==================== Request ====================

    #[test]
    fn test_submit_failure_cancels_request() {
        let mut net = MockNetwork::new().with_nic(
            MockNic::ethernet().reply(Reply::SubmitError(NetworkError::ConnectionFailed)),
        );
        let mut dest = [0u8; 8];
        let mut ctx = context("http://h/p", &mut dest);

        assert_eq!(
            exchange(&mut net, &mut ctx, 64),
            Err(NetworkError::ConnectionFailed)
        );
        let journal = net.journal();
        assert_eq!(journal.cancels, [Operation::Request]);
        assert!(journal.reads.is_empty());
    }

    #[test]
    fn test_request_headers_sent() {
        let mut net = network(vec![ScriptedResponse::ok(b"")]);
        let mut dest = [0u8; 8];
        let mut ctx = context("http://h:5000/update", &mut dest);

        exchange(&mut net, &mut ctx, 64).unwrap();
        let journal = net.journal();
        let headers: Vec<(&str, &str)> = journal.requests[0]
            .headers
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            headers,
            [("Host", "h:5000"), ("Connection", "close"), ("User-Agent", "test-agent")]
        );
        assert_eq!(journal.requests[0].url, "http://h:5000/update");
    }
}
