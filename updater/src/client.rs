//! Update check and image download.
//!
//! The update endpoint answers 404 while nothing is published and a JSON
//! [`UpdateNotice`] otherwise. Images are fetched in two steps: a HEAD
//! probe learns the size, then a buffer of exactly that size is filled by
//! a GET.

use alloc::string::String;
use alloc::vec::Vec;

use morpheus_httpdl::client::{DownloadConfig, Downloader, InterfaceProvider};
use morpheus_httpdl::time::TimerSource;
use morpheus_httpdl::{NetworkError, ProgressCallback};
use tracing::{debug, info};

use crate::error::UpdateError;
use crate::notice::UpdateNotice;

/// Destination size for the notice body (4 KiB).
pub const NOTICE_BUFFER_SIZE: usize = 4 * 1024;

/// Status the update endpoint uses for "nothing published".
const NOTHING_PUBLISHED: u16 = 404;

/// Talks to one update endpoint.
pub struct UpdateClient<N, C> {
    downloader: Downloader<N, C>,
    update_url: String,
    metadata: DownloadConfig,
    images: DownloadConfig,
}

impl<N: InterfaceProvider, C: TimerSource> UpdateClient<N, C> {
    /// Client for `update_url` with the metadata and image presets.
    pub fn new(network: N, clock: C, update_url: &str) -> Self {
        Self::with_configs(
            network,
            clock,
            update_url,
            DownloadConfig::for_metadata(),
            DownloadConfig::for_images(),
        )
    }

    pub fn with_configs(
        network: N,
        clock: C,
        update_url: &str,
        metadata: DownloadConfig,
        images: DownloadConfig,
    ) -> Self {
        Self {
            downloader: Downloader::with_config(network, clock, metadata.clone()),
            update_url: String::from(update_url),
            metadata,
            images,
        }
    }

    pub fn update_url(&self) -> &str {
        &self.update_url
    }

    pub fn downloader(&self) -> &Downloader<N, C> {
        &self.downloader
    }

    /// Ask the endpoint whether an update is published.
    ///
    /// Returns `None` when the endpoint reports nothing published.
    pub fn check(&mut self) -> Result<Option<UpdateNotice>, UpdateError> {
        self.downloader.set_config(self.metadata.clone());
        let mut body = allocate(NOTICE_BUFFER_SIZE)?;

        match self.downloader.download(&self.update_url, &mut body, None) {
            Ok(written) => {
                let notice = UpdateNotice::parse(&body[..written])?;
                info!("{}", notice.message);
                Ok(Some(notice))
            }
            Err(NetworkError::HttpError {
                code: NOTHING_PUBLISHED,
                ..
            }) => {
                info!("No update published");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Download the image a notice points to.
    ///
    /// Progress lines go to `progress`, or to the log when absent.
    pub fn fetch_image(
        &mut self,
        notice: &UpdateNotice,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<Vec<u8>, UpdateError> {
        self.downloader.set_config(self.images.clone());

        let mut empty: [u8; 0] = [];
        let required = match self.downloader.download(&notice.image_url, &mut empty, None) {
            Err(NetworkError::BufferTooSmall { required }) => required,
            Ok(_) if self.downloader.entity_length() == Some(0) => {
                info!("Image is empty");
                return Ok(Vec::new());
            }
            Ok(_) => {
                debug!("probe of {} reported no length", notice.image_url);
                return Err(UpdateError::Network(NetworkError::InvalidResponse));
            }
            Err(e) => return Err(e.into()),
        };
        info!("Image is {} bytes", required);

        let mut image = allocate(required)?;
        let written = self.downloader.download(&notice.image_url, &mut image, progress)?;
        image.truncate(written);
        Ok(image)
    }
}

/// Zeroed buffer of `len` bytes, or `OutOfMemory`.
fn allocate(len: usize) -> Result<Vec<u8>, UpdateError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| UpdateError::OutOfMemory)?;
    buffer.resize(len, 0);
    Ok(buffer)
}
