//! Download orchestration.
//!
//! Tries each network interface in enumeration order. On one interface a
//! download is a loop of exchanges: every redirect rewrites the target and
//! repeats the exchange on a fresh session.
//!
//! # Examples
//!
//! ```ignore
//! use morpheus_httpdl::client::{DownloadConfig, Downloader};
//!
//! let mut downloader = Downloader::with_config(platform, timers, DownloadConfig::for_images());
//!
//! // Probe: an empty destination issues HEAD and reports the size.
//! let size = match downloader.download(url, &mut [], None) {
//!     Err(NetworkError::BufferTooSmall { required }) => required,
//!     other => return other.map(|_| ()),
//! };
//!
//! let mut image = vec![0u8; size];
//! let written = downloader.download(url, &mut image, Some(&mut |line| log(line)))?;
//! ```

use alloc::string::String;

use smoltcp::wire::Ipv4Cidr;
use tracing::{debug, info, warn};

use super::context::{DownloadContext, RequestStatus};
use super::exchange::{receive_response, send_request};
use super::transport::{InterfaceProvider, Nic, SessionConfig, Transport};
use crate::error::{NetworkError, Result};
use crate::http::{Request, DEFAULT_USER_AGENT};
use crate::time::{TimerSource, DEFAULT_WAIT_TIMEOUT_MS};
use crate::transfer::Progress;
use crate::types::ProgressCallback;
use crate::url::UrlParts;
use crate::utils::buffer::{effective_buffer_size, ScratchBuffer, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};

/// Redirect hops followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Download configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Read window size; 0 or more than 4 MiB selects the default.
    pub buffer_size: usize,
    /// HTTP protocol timeout (ms, 0 = firmware default).
    pub timeout_ms: u32,
    /// Budget for each request or response completion (ms).
    pub wait_timeout_ms: u64,
    /// Redirect hops followed per interface.
    pub max_redirects: u32,
    /// Only use the interface with this name (`eth0`, `unk1`, ...).
    pub nic_name: Option<String>,
    /// Local port (0 = ephemeral).
    pub local_port: u16,
    /// Static station address; `None` uses the interface default.
    pub local_address: Option<Ipv4Cidr>,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            timeout_ms: 0,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            nic_name: None,
            local_port: 0,
            local_address: None,
            user_agent: String::from(DEFAULT_USER_AGENT),
        }
    }
}

impl DownloadConfig {
    /// Configuration for small JSON/metadata documents.
    pub fn for_metadata() -> Self {
        Self {
            buffer_size: 8 * 1024,
            wait_timeout_ms: 5_000,
            ..Self::default()
        }
    }

    /// Configuration for firmware and disk images.
    pub fn for_images() -> Self {
        Self {
            buffer_size: MAX_BUFFER_SIZE,
            wait_timeout_ms: 30_000,
            ..Self::default()
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_wait_timeout_ms(mut self, wait_timeout_ms: u64) -> Self {
        self.wait_timeout_ms = wait_timeout_ms;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_nic_name(mut self, nic_name: &str) -> Self {
        self.nic_name = Some(String::from(nic_name));
        self
    }

    pub fn with_local_port(mut self, local_port: u16) -> Self {
        self.local_port = local_port;
        self
    }

    pub fn with_local_address(mut self, local_address: Ipv4Cidr) -> Self {
        self.local_address = Some(local_address);
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = String::from(user_agent);
        self
    }

    /// Session parameters derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            timeout_ms: self.timeout_ms,
            local_port: self.local_port,
            local_address: self.local_address,
        }
    }
}

/// Downloads resources into caller-supplied buffers.
///
/// Owns the interface provider and the timer source for the duration of
/// its use; one download runs at a time.
pub struct Downloader<N, C> {
    network: N,
    clock: C,
    config: DownloadConfig,
    entity_length: Option<usize>,
}

impl<N: InterfaceProvider, C: TimerSource> Downloader<N, C> {
    /// Create a new downloader with default configuration.
    pub fn new(network: N, clock: C) -> Self {
        Self::with_config(network, clock, DownloadConfig::default())
    }

    /// Create a downloader with custom configuration.
    pub fn with_config(network: N, clock: C, config: DownloadConfig) -> Self {
        Self {
            network,
            clock,
            config,
            entity_length: None,
        }
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Replace the configuration used by later downloads.
    pub fn set_config(&mut self, config: DownloadConfig) {
        self.config = config;
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Entity length announced by the response that ended the last
    /// successful download, if it carried one.
    ///
    /// Tells a probe of an empty entity (`Some(0)`) apart from one whose
    /// length the server did not report (`None`).
    pub fn entity_length(&self) -> Option<usize> {
        self.entity_length
    }

    /// Fetch `url` into `destination`.
    ///
    /// An empty destination sends HEAD instead of GET: the entity length is
    /// reported through `BufferTooSmall { required }` without transferring
    /// the body. Bytes beyond the destination are dropped. Progress lines
    /// go to `progress`, or to the log when absent.
    ///
    /// Returns the number of bytes written into `destination`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty URL or host
    /// - `NotFound` when no interface matches, or for a redirect without
    ///   `Location`
    /// - `BufferTooSmall` from a probe whose entity does not fit
    /// - `HttpError` with the status and the number of body bytes stored
    /// - `RecursiveRedirect`, `TooManyRedirects`, `Timeout`
    /// - the last interface's transport error when every interface failed
    pub fn download(
        &mut self,
        url: &str,
        destination: &mut [u8],
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<usize> {
        let target = UrlParts::compose(url)?;
        let mut ctx = DownloadContext::new(target, Progress::new(destination, progress));
        info!(
            "{} {}{}",
            ctx.method.as_str(),
            ctx.target.server_and_scheme(),
            ctx.target.uri()
        );

        self.entity_length = None;
        let nics = self.network.interfaces()?;
        let mut last_error = None;

        for nic in &nics {
            if let Some(wanted) = self.config.nic_name.as_deref() {
                if nic.name != wanted {
                    debug!("skipping {}", nic.name);
                    continue;
                }
            }

            if let Err(e) = self.network.prepare_interface(nic) {
                warn!("{}: address configuration failed: {}", nic.name, e);
            }

            ctx.restart();
            match self.download_on(nic, &mut ctx) {
                Ok(written) => {
                    info!("{}: {} bytes downloaded", nic.name, written);
                    self.entity_length = ctx.entity_length;
                    return Ok(written);
                }
                Err(e) if e.is_interface_specific() => {
                    warn!("{}: {}, trying next interface", nic.name, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(NetworkError::NotFound))
    }

    /// Run the request/redirect loop on one interface.
    fn download_on(&mut self, nic: &Nic, ctx: &mut DownloadContext<'_, '_>) -> Result<usize> {
        let buffer_size = effective_buffer_size(self.config.buffer_size);
        if buffer_size != self.config.buffer_size {
            warn!(
                "buffer size {} out of range, using {}",
                self.config.buffer_size, buffer_size
            );
        }
        let mut scratch = ScratchBuffer::allocate(buffer_size)?;
        let wait_ms = self.config.wait_timeout_ms;
        let mut hops = 0u32;

        loop {
            ctx.status = RequestStatus::Ok;
            {
                let mut session = self.network.open_session(nic)?;
                session.configure(&self.config.session_config())?;
                let request = Request::build(ctx.method, &ctx.target, &self.config.user_agent)?;
                send_request(&mut session, &mut self.clock, &request, wait_ms)?;
                receive_response(&mut session, &mut self.clock, ctx, &mut scratch, wait_ms)?;
            }

            match ctx.status {
                RequestStatus::Ok => return Ok(ctx.progress.downloaded()),
                RequestStatus::HttpError(code) => {
                    return Err(NetworkError::HttpError {
                        code,
                        received: ctx.progress.downloaded(),
                    })
                }
                RequestStatus::NeedRepeat => {
                    hops += 1;
                    if hops > self.config.max_redirects {
                        warn!("giving up after {} redirects", self.config.max_redirects);
                        return Err(NetworkError::TooManyRedirects);
                    }
                    debug!("repeating request, hop {}", hops);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::Operation;
    use crate::mock::{MockNetwork, MockNic, PollClock, Reply, ScriptedResponse};
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use proptest::prelude::*;
    use smoltcp::wire::Ipv4Address;
    use tracing_test::traced_test;

    fn downloader(network: MockNetwork) -> Downloader<MockNetwork, PollClock> {
        Downloader::new(network, PollClock::new(100))
    }

    // ==================== Config ====================

    #[test]
    fn test_config_defaults() {
        let config = DownloadConfig::default();
        assert_eq!(config.buffer_size, 32 * 1024);
        assert_eq!(config.wait_timeout_ms, 10_000);
        assert_eq!(config.max_redirects, 10);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.nic_name.is_none());
    }

    #[test]
    fn test_config_presets() {
        assert_eq!(DownloadConfig::for_images().buffer_size, MAX_BUFFER_SIZE);
        assert!(DownloadConfig::for_metadata().buffer_size < DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn test_session_config() {
        let cidr = Ipv4Cidr::new(Ipv4Address::new(192, 168, 10, 50), 24);
        let config = DownloadConfig::default()
            .with_timeout_ms(3_000)
            .with_local_port(40_000)
            .with_local_address(cidr);
        assert_eq!(
            config.session_config(),
            SessionConfig {
                timeout_ms: 3_000,
                local_port: 40_000,
                local_address: Some(cidr),
            }
        );
    }

    // ==================== Basic Downloads ====================

    #[test]
    fn test_download_simple() {
        let network = MockNetwork::new()
            .with_nic(MockNic::ethernet().respond(ScriptedResponse::ok(b"Hello World")));
        let mut downloader = downloader(network);

        let mut dest = [0u8; 64];
        let written = downloader
            .download("http://example.com/file.txt", &mut dest, None)
            .unwrap();
        assert_eq!(&dest[..written], b"Hello World");

        let journal = downloader.network().journal();
        assert_eq!(journal.sessions_opened, 1);
        assert_eq!(journal.sessions_closed, 1);
        assert_eq!(journal.prepared, ["eth0"]);
        assert_eq!(journal.configs, [SessionConfig::default()]);
    }

    #[test]
    fn test_download_with_progress() {
        let body = vec![7u8; 1000];
        let network = MockNetwork::new()
            .with_nic(MockNic::ethernet().respond(ScriptedResponse::ok(&body).read_size(100)));
        let mut downloader = downloader(network);

        let mut lines: Vec<String> = Vec::new();
        let mut on_progress = |line: &str| lines.push(line.to_string());
        let mut dest = vec![0u8; 1000];
        let written = downloader
            .download("http://h/f", &mut dest, Some(&mut on_progress))
            .unwrap();

        assert_eq!(written, 1000);
        assert_eq!(lines.len(), 10);
        assert!(lines.last().unwrap().contains("=>]"));
    }

    #[test]
    #[traced_test]
    fn test_download_logs_progress_without_callback() {
        let network = MockNetwork::new()
            .with_nic(MockNic::ethernet().respond(ScriptedResponse::ok(&[1u8; 2048])));
        let mut downloader = downloader(network);

        let mut dest = [0u8; 2048];
        downloader.download("http://h/f", &mut dest, None).unwrap();
        assert!(logs_contain("2 Kb"));
    }

    #[test]
    fn test_invalid_url() {
        let mut downloader = downloader(MockNetwork::new().with_nic(MockNic::ethernet()));
        let mut dest = [0u8; 4];
        assert_eq!(
            downloader.download("  ", &mut dest, None),
            Err(NetworkError::InvalidArgument)
        );
        assert!(downloader.network().journal().requests.is_empty());
    }

    #[test]
    fn test_http_error_reports_body() {
        let network = MockNetwork::new()
            .with_nic(MockNic::ethernet().respond(ScriptedResponse::error(404, b"gone")));
        let mut downloader = downloader(network);

        let mut dest = [0u8; 16];
        assert_eq!(
            downloader.download("http://h/missing", &mut dest, None),
            Err(NetworkError::HttpError { code: 404, received: 4 })
        );
        assert_eq!(&dest[..4], b"gone");
    }

    #[test]
    fn test_timeout_is_surfaced() {
        let network = MockNetwork::new()
            .with_nic(MockNic::ethernet().reply(Reply::Stall))
            .with_nic(MockNic::ethernet().respond(ScriptedResponse::ok(b"unused")));
        let mut downloader = downloader(network);

        let mut dest = [0u8; 16];
        assert_eq!(
            downloader.download("http://h/f", &mut dest, None),
            Err(NetworkError::Timeout)
        );
        let journal = downloader.network().journal();
        assert_eq!(journal.cancels, [Operation::Request]);
        assert_eq!(journal.requests.len(), 1);
    }

    #[test]
    fn test_wait_budget_from_config() {
        let network = MockNetwork::new()
            .with_nic(MockNic::ethernet().respond(ScriptedResponse::ok(b"x")));
        let clock = PollClock::new(100);
        let mut downloader = Downloader::with_config(
            network,
            clock.clone(),
            DownloadConfig::default().with_wait_timeout_ms(2_500),
        );

        let mut dest = [0u8; 4];
        downloader.download("http://h/f", &mut dest, None).unwrap();
        assert_eq!(clock.last_timeout_ms(), 2_500);
    }

    // ==================== Redirects ====================

    #[test]
    fn test_redirect_chain() {
        let network = MockNetwork::new().with_nic(
            MockNic::ethernet()
                .respond(ScriptedResponse::redirect(302, "/p2"))
                .respond(ScriptedResponse::redirect(301, "//mirror/p3"))
                .respond(ScriptedResponse::ok(b"payload")),
        );
        let mut downloader = downloader(network);

        let mut dest = [0u8; 16];
        let written = downloader.download("http://h/p1", &mut dest, None).unwrap();
        assert_eq!(&dest[..written], b"payload");

        let journal = downloader.network().journal();
        assert_eq!(
            journal.urls(),
            ["http://h/p1", "http://h/p2", "http://mirror/p3"]
        );
        assert_eq!(journal.requests[2].headers[0], ("Host".to_string(), "mirror".to_string()));
        assert_eq!(journal.sessions_opened, 3);
        assert_eq!(journal.sessions_closed, 3);
    }

    #[test]
    fn test_self_redirect_stops_immediately() {
        let network = MockNetwork::new().with_nic(
            MockNic::ethernet()
                .respond(ScriptedResponse::redirect(302, "http://h/p"))
                .respond(ScriptedResponse::ok(b"never")),
        );
        let mut downloader = downloader(network);

        let mut dest = [0u8; 16];
        assert_eq!(
            downloader.download("http://h/p", &mut dest, None),
            Err(NetworkError::RecursiveRedirect)
        );
        assert_eq!(downloader.network().journal().requests.len(), 1);
    }

    #[test]
    fn test_redirect_cycle_is_bounded() {
        let mut nic = MockNic::ethernet();
        for i in 0..20 {
            let location = if i % 2 == 0 { "/b" } else { "/a" };
            nic = nic.respond(ScriptedResponse::redirect(302, location));
        }
        let mut downloader = Downloader::with_config(
            MockNetwork::new().with_nic(nic),
            PollClock::new(100),
            DownloadConfig::default().with_max_redirects(3),
        );

        let mut dest = [0u8; 16];
        assert_eq!(
            downloader.download("http://h/a", &mut dest, None),
            Err(NetworkError::TooManyRedirects)
        );
        assert_eq!(downloader.network().journal().requests.len(), 4);
    }

    // ==================== Interfaces ====================

    #[test]
    fn test_transport_error_moves_to_next_interface() {
        let network = MockNetwork::new()
            .with_nic(MockNic::ethernet().failing_open(NetworkError::ProtocolNotAvailable))
            .with_nic(MockNic::ethernet().failing_configure(NetworkError::InitializationFailed))
            .with_nic(MockNic::ethernet().respond(ScriptedResponse::ok(b"third")));
        let mut downloader = downloader(network);

        let mut dest = [0u8; 16];
        let written = downloader.download("http://h/f", &mut dest, None).unwrap();
        assert_eq!(&dest[..written], b"third");

        let journal = downloader.network().journal();
        assert_eq!(journal.prepared, ["eth0", "eth1", "eth2"]);
        assert_eq!(journal.requests[0].nic, "eth2");
    }

    #[test]
    fn test_last_transport_error_when_all_fail() {
        let network = MockNetwork::new()
            .with_nic(MockNic::ethernet().reply(Reply::SubmitError(NetworkError::ConnectionFailed)))
            .with_nic(MockNic::other().failing_open(NetworkError::ProtocolNotAvailable));
        let mut downloader = downloader(network);

        let mut dest = [0u8; 16];
        assert_eq!(
            downloader.download("http://h/f", &mut dest, None),
            Err(NetworkError::ProtocolNotAvailable)
        );
    }

    #[test]
    fn test_protocol_error_does_not_try_next_interface() {
        let network = MockNetwork::new()
            .with_nic(MockNic::ethernet().respond(ScriptedResponse::error(500, b"")))
            .with_nic(MockNic::ethernet().respond(ScriptedResponse::ok(b"unused")));
        let mut downloader = downloader(network);

        let mut dest = [0u8; 16];
        assert_eq!(
            downloader.download("http://h/f", &mut dest, None),
            Err(NetworkError::HttpError { code: 500, received: 0 })
        );
        assert_eq!(downloader.network().journal().prepared, ["eth0"]);
    }

    #[test]
    fn test_nic_name_filter() {
        let network = MockNetwork::new()
            .with_nic(MockNic::ethernet().respond(ScriptedResponse::ok(b"first")))
            .with_nic(MockNic::other().respond(ScriptedResponse::ok(b"second")));
        let mut downloader = Downloader::with_config(
            network,
            PollClock::new(100),
            DownloadConfig::default().with_nic_name("unk1"),
        );

        let mut dest = [0u8; 16];
        let written = downloader.download("http://h/f", &mut dest, None).unwrap();
        assert_eq!(&dest[..written], b"second");
        assert_eq!(downloader.network().journal().prepared, ["unk1"]);
    }

    #[test]
    fn test_nic_name_not_found() {
        let network = MockNetwork::new()
            .with_nic(MockNic::ethernet().respond(ScriptedResponse::ok(b"x")));
        let mut downloader = Downloader::with_config(
            network,
            PollClock::new(100),
            DownloadConfig::default().with_nic_name("eth7"),
        );

        let mut dest = [0u8; 16];
        assert_eq!(
            downloader.download("http://h/f", &mut dest, None),
            Err(NetworkError::NotFound)
        );
    }

    #[test]
    fn test_no_interfaces() {
        let mut downloader = downloader(MockNetwork::new());
        let mut dest = [0u8; 16];
        assert_eq!(
            downloader.download("http://h/f", &mut dest, None),
            Err(NetworkError::NotFound)
        );
    }

    #[test]
    fn test_unnamed_interface_skipped() {
        let network = MockNetwork::new()
            .with_nic(MockNic::unnamed().respond(ScriptedResponse::ok(b"hidden")))
            .with_nic(MockNic::ethernet().respond(ScriptedResponse::ok(b"named")));
        let mut downloader = downloader(network);

        let mut dest = [0u8; 16];
        let written = downloader.download("http://h/f", &mut dest, None).unwrap();
        assert_eq!(&dest[..written], b"named");
        assert_eq!(downloader.network().journal().prepared, ["eth1"]);
    }

    #[test]
    #[traced_test]
    fn test_prepare_failure_is_not_fatal() {
        let network = MockNetwork::new().with_nic(
            MockNic::ethernet()
                .failing_prepare(NetworkError::InitializationFailed)
                .respond(ScriptedResponse::ok(b"ok")),
        );
        let mut downloader = downloader(network);

        let mut dest = [0u8; 16];
        assert_eq!(downloader.download("http://h/f", &mut dest, None), Ok(2));
        assert!(logs_contain("address configuration failed"));
    }

    #[test]
    fn test_enumeration_failure() {
        let network = MockNetwork::new().failing_enumeration(NetworkError::ProtocolNotAvailable);
        let mut downloader = downloader(network);
        let mut dest = [0u8; 16];
        assert_eq!(
            downloader.download("http://h/f", &mut dest, None),
            Err(NetworkError::ProtocolNotAvailable)
        );
    }

    // ==================== Probe ====================

    #[test]
    fn test_probe_then_download() {
        let body = vec![0xA5u8; 3000];
        let network = MockNetwork::new().with_nic(
            MockNic::ethernet()
                .respond(ScriptedResponse::probe(body.len()))
                .respond(ScriptedResponse::ok(&body)),
        );
        let mut downloader = downloader(network);

        let required = match downloader.download("http://h/img", &mut [], None) {
            Err(NetworkError::BufferTooSmall { required }) => required,
            other => panic!("unexpected probe result {:?}", other),
        };
        assert_eq!(required, 3000);

        let mut image = vec![0u8; required];
        assert_eq!(downloader.download("http://h/img", &mut image, None), Ok(3000));
        assert_eq!(image, body);

        let journal = downloader.network().journal();
        assert_eq!(journal.requests[0].method, crate::types::HttpMethod::Head);
        assert_eq!(journal.requests[1].method, crate::types::HttpMethod::Get);
    }

    #[test]
    fn test_head_of_empty_entity() {
        let network = MockNetwork::new().with_nic(
            MockNic::ethernet()
                .respond(ScriptedResponse::probe(0))
                .respond(ScriptedResponse::new(200)),
        );
        let mut downloader = downloader(network);

        assert_eq!(downloader.download("http://h/empty", &mut [], None), Ok(0));
        assert_eq!(downloader.entity_length(), Some(0));

        assert_eq!(downloader.download("http://h/unknown", &mut [], None), Ok(0));
        assert_eq!(downloader.entity_length(), None);
    }

    #[test]
    fn test_probe_error_status_without_length() {
        let network = MockNetwork::new()
            .with_nic(MockNic::ethernet().respond(ScriptedResponse::new(404)));
        let mut downloader = downloader(network);

        assert_eq!(
            downloader.download("http://h/img", &mut [], None),
            Err(NetworkError::HttpError { code: 404, received: 0 })
        );
    }

    proptest! {
        #[test]
        fn prop_probe_reports_entity_length(length in 1usize..1_000_000_000) {
            let network = MockNetwork::new()
                .with_nic(MockNic::ethernet().respond(ScriptedResponse::probe(length)));
            let mut downloader = downloader(network);

            prop_assert_eq!(
                downloader.download("http://h/img", &mut [], None),
                Err(NetworkError::BufferTooSmall { required: length })
            );
        }

        #[test]
        fn prop_destination_holds_prefix(
            body in proptest::collection::vec(any::<u8>(), 0..2048),
            capacity in 1usize..4096,
            read_size in 1usize..512,
        ) {
            let network = MockNetwork::new().with_nic(
                MockNic::ethernet().respond(ScriptedResponse::ok(&body).read_size(read_size)),
            );
            let mut downloader = Downloader::with_config(
                network,
                PollClock::new(100),
                DownloadConfig::default().with_buffer_size(256),
            );

            let mut dest = vec![0u8; capacity];
            let written = downloader.download("http://h/f", &mut dest, None).unwrap();
            prop_assert_eq!(written, body.len().min(capacity));
            prop_assert_eq!(&dest[..written], &body[..written]);
        }
    }
}
