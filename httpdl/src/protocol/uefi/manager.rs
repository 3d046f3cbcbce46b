//! UEFI protocol manager for HTTP sessions.
//!
//! Manages the lifecycle of one HTTP protocol instance on one interface:
//! - Creating a child through the interface's service binding
//! - Opening the protocol on the child
//! - Configuring HTTP parameters
//! - Unconfiguring and destroying the child on drop
//!
//! # Architecture
//!
//! ```text
//! controller handle (one per NIC)
//!   │ OpenProtocol(ServiceBinding)
//!   ▼
//! ServiceBindingProtocol ──CreateChild──> child handle
//!                                          │ OpenProtocol(Http)
//!                                          ▼
//!                                   HttpProtocol ──Configure──> ready
//! ```
//!
//! `ServiceChild` is generic over the protocol so interface naming can use
//! the same path for a short-lived managed network child.

use alloc::boxed::Box;
use core::ffi::c_void;
use core::ptr;

use tracing::debug;

use super::bindings::{
    status, BootServices, Guid, Handle, HttpAccessPoint, HttpConfigData, HttpIpv4AccessPoint,
    HttpProtocol, HttpVersion, ServiceBindingProtocol, HTTP_PROTOCOL_GUID,
    HTTP_SERVICE_BINDING_GUID, OPEN_PROTOCOL_GET_PROTOCOL,
};
use crate::client::SessionConfig;
use crate::error::{NetworkError, Result};

/// A protocol instance on a child created through a service binding.
///
/// Dropping it closes the protocol and destroys the child.
pub struct ServiceChild<P> {
    bs: &'static BootServices,
    image: Handle,
    controller: Handle,
    binding_guid: &'static Guid,
    protocol_guid: &'static Guid,
    service: *mut ServiceBindingProtocol,
    handle: Handle,
    interface: *mut P,
}

impl<P> ServiceChild<P> {
    /// Create a child of `binding_guid` on `controller` and open
    /// `protocol_guid` on it.
    ///
    /// # Errors
    ///
    /// `ProtocolNotAvailable` if the service binding is missing, the child
    /// cannot be created or the protocol cannot be opened.
    ///
    /// # Safety
    ///
    /// `controller` and `image` must be valid handles and boot services
    /// must not have been exited.
    pub unsafe fn create(
        bs: &'static BootServices,
        image: Handle,
        controller: Handle,
        binding_guid: &'static Guid,
        protocol_guid: &'static Guid,
    ) -> Result<Self> {
        let mut service_ptr: *mut c_void = ptr::null_mut();
        let st = (bs.open_protocol)(
            controller,
            binding_guid,
            &mut service_ptr,
            image,
            controller,
            OPEN_PROTOCOL_GET_PROTOCOL,
        );
        if !status::is_success(st) || service_ptr.is_null() {
            return Err(NetworkError::ProtocolNotAvailable);
        }
        let service = service_ptr as *mut ServiceBindingProtocol;

        let mut handle: Handle = ptr::null_mut();
        let st = ((*service).create_child)(service, &mut handle);
        status::check(st, NetworkError::ProtocolNotAvailable)?;
        if handle.is_null() {
            return Err(NetworkError::ProtocolNotAvailable);
        }

        let mut interface: *mut c_void = ptr::null_mut();
        let st = (bs.open_protocol)(
            handle,
            protocol_guid,
            &mut interface,
            image,
            controller,
            OPEN_PROTOCOL_GET_PROTOCOL,
        );
        if !status::is_success(st) || interface.is_null() {
            ((*service).destroy_child)(service, handle);
            return Err(NetworkError::ProtocolNotAvailable);
        }

        Ok(Self {
            bs,
            image,
            controller,
            binding_guid,
            protocol_guid,
            service,
            handle,
            interface: interface as *mut P,
        })
    }

    /// The opened protocol interface. Valid until the child is dropped.
    pub fn interface(&self) -> *mut P {
        self.interface
    }
}

impl<P> Drop for ServiceChild<P> {
    fn drop(&mut self) {
        // SAFETY: the handles and the service binding were valid when the
        // child was created and nothing else destroys them.
        unsafe {
            (self.bs.close_protocol)(self.handle, self.protocol_guid, self.image, self.controller);
            let st = ((*self.service).destroy_child)(self.service, self.handle);
            if !status::is_success(st) {
                debug!(
                    "destroying service child {:08x} failed: {:#x}",
                    self.binding_guid.data1, st
                );
            }
        }
    }
}

/// State of the protocol manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// Child HTTP instance created.
    ChildCreated,
    /// HTTP protocol configured and ready.
    Configured,
    /// Configuration was rejected.
    Error,
}

/// UEFI Protocol Manager.
///
/// Owns the HTTP child of one session.
pub struct ProtocolManager {
    state: ManagerState,
    child: ServiceChild<HttpProtocol>,
    /// IPv4 access point (must be kept alive while configured).
    access_point: Box<HttpIpv4AccessPoint>,
}

impl ProtocolManager {
    /// Create and open an HTTP child on `controller`.
    ///
    /// # Safety
    ///
    /// Same requirements as [`ServiceChild::create`].
    pub unsafe fn open(bs: &'static BootServices, image: Handle, controller: Handle) -> Result<Self> {
        let child = ServiceChild::create(
            bs,
            image,
            controller,
            &HTTP_SERVICE_BINDING_GUID,
            &HTTP_PROTOCOL_GUID,
        )?;
        Ok(Self {
            state: ManagerState::ChildCreated,
            child,
            access_point: Box::new(HttpIpv4AccessPoint::default()),
        })
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ManagerState::Configured
    }

    /// The HTTP protocol pointer, once configured.
    pub fn http_protocol(&self) -> Result<*mut HttpProtocol> {
        if self.is_ready() {
            Ok(self.child.interface())
        } else {
            Err(NetworkError::InitializationFailed)
        }
    }

    /// Configure the HTTP instance for HTTP/1.1 over IPv4.
    ///
    /// # Errors
    ///
    /// `InitializationFailed` if the firmware rejects the configuration.
    pub fn configure(&mut self, config: &SessionConfig) -> Result<()> {
        let http = self.child.interface();
        *self.access_point = access_point_for(config);

        let config_data = HttpConfigData {
            http_version: HttpVersion::Http11,
            timeout_millisec: config.timeout_ms,
            local_addr_is_ipv6: false,
            access_point: HttpAccessPoint {
                ipv4_node: &mut *self.access_point,
            },
        };

        // SAFETY: `http` was opened on a live child; `config_data` and the
        // boxed access point outlive the call.
        let st = unsafe { ((*http).configure)(http, &config_data) };
        if let Err(e) = status::check(st, NetworkError::InitializationFailed) {
            self.state = ManagerState::Error;
            return Err(e);
        }

        debug!(
            "HTTP child configured (timeout {} ms, port {})",
            config.timeout_ms, config.local_port
        );
        self.state = ManagerState::Configured;
        Ok(())
    }
}

impl Drop for ProtocolManager {
    fn drop(&mut self) {
        if self.state == ManagerState::Configured {
            let http = self.child.interface();
            // SAFETY: the child is still open; a null configuration resets
            // the instance.
            unsafe {
                ((*http).configure)(http, ptr::null());
            }
        }
    }
}

/// IPv4 access point for `config`: the interface default address unless a
/// static one is given.
pub fn access_point_for(config: &SessionConfig) -> HttpIpv4AccessPoint {
    let mut access_point = HttpIpv4AccessPoint {
        local_port: config.local_port,
        ..HttpIpv4AccessPoint::default()
    };
    if let Some(cidr) = config.local_address {
        access_point.use_default_address = false;
        access_point.local_address = cidr.address().0;
        access_point.local_subnet = cidr.netmask().0;
    }
    access_point
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use smoltcp::wire::{Ipv4Address, Ipv4Cidr};

    #[test]
    fn test_access_point_defaults() {
        let ap = access_point_for(&SessionConfig::default());
        assert!(ap.use_default_address);
        assert_eq!(ap.local_address, [0; 4]);
        assert_eq!(ap.local_port, 0);
    }

    #[test]
    fn test_access_point_port() {
        let config = SessionConfig {
            local_port: 5000,
            ..SessionConfig::default()
        };
        let ap = access_point_for(&config);
        assert!(ap.use_default_address);
        assert_eq!(ap.local_port, 5000);
    }

    #[test]
    fn test_access_point_static_address() {
        let config = SessionConfig {
            local_address: Some(Ipv4Cidr::new(Ipv4Address::new(192, 168, 10, 40), 24)),
            ..SessionConfig::default()
        };
        let ap = access_point_for(&config);
        assert!(!ap.use_default_address);
        assert_eq!(ap.local_address, [192, 168, 10, 40]);
        assert_eq!(ap.local_subnet, [255, 255, 255, 0]);
    }

    #[test]
    fn test_manager_state_enum() {
        assert_ne!(ManagerState::ChildCreated, ManagerState::Configured);
        assert_ne!(ManagerState::Configured, ManagerState::Error);
    }
}
