//! Network interface enumeration and address preparation.
//!
//! Interfaces are the handles carrying the managed network service binding,
//! in firmware order. Each is named from its link type (`eth<N>` for
//! Ethernet, `unk<N>` otherwise). Before a download, an interface without a
//! station address is switched to DHCP.

use alloc::vec::Vec;
use core::ffi::c_void;
use core::mem::size_of;
use core::ptr;

use smoltcp::wire::Ipv4Address;
use tracing::{debug, info, warn};

use super::bindings::{
    status, BootServices, Handle, Ip4Config2DataType, Ip4Config2InterfaceInfo, Ip4Config2Policy,
    Ip4Config2Protocol, ManagedNetworkProtocol, SimpleNetworkMode, IP4_CONFIG2_PROTOCOL_GUID,
    LOCATE_HANDLE_BY_PROTOCOL, MNP_PROTOCOL_GUID, MNP_SERVICE_BINDING_GUID,
};
use super::manager::ServiceChild;
use super::session::UefiSession;
use crate::client::{InterfaceProvider, Nic};
use crate::error::{NetworkError, Result};

/// Whether an interface should be switched to DHCP.
pub fn needs_dhcp(station: Ipv4Address, policy: Ip4Config2Policy) -> bool {
    station.is_unspecified() && policy != Ip4Config2Policy::DHCP
}

/// Firmware-backed interfaces and HTTP sessions.
pub struct UefiPlatform {
    bs: &'static BootServices,
    image: Handle,
    /// Controller handles from the last enumeration, by index.
    controllers: Vec<Handle>,
}

impl UefiPlatform {
    /// # Safety
    ///
    /// `boot_services` must point to the firmware boot services table,
    /// `image_handle` must be the running image, and both must stay valid
    /// until boot services are exited.
    pub unsafe fn new(boot_services: *const BootServices, image_handle: Handle) -> Result<Self> {
        let bs = boot_services
            .as_ref()
            .ok_or(NetworkError::InitializationFailed)?;
        Ok(Self {
            bs,
            image: image_handle,
            controllers: Vec::new(),
        })
    }

    fn controller(&self, nic: &Nic) -> Result<Handle> {
        self.controllers
            .get(nic.index)
            .copied()
            .ok_or(NetworkError::NotFound)
    }

    /// All handles carrying the managed network service binding.
    fn locate_controllers(&self) -> Result<Vec<Handle>> {
        let mut count = 0usize;
        let mut buffer: *mut Handle = ptr::null_mut();
        // SAFETY: boot services are valid; the out-pointers are local.
        let st = unsafe {
            (self.bs.locate_handle_buffer)(
                LOCATE_HANDLE_BY_PROTOCOL,
                &MNP_SERVICE_BINDING_GUID,
                ptr::null(),
                &mut count,
                &mut buffer,
            )
        };
        if st == status::NOT_FOUND {
            return Ok(Vec::new());
        }
        status::check(st, NetworkError::ProtocolNotAvailable)?;
        if buffer.is_null() {
            return Ok(Vec::new());
        }

        let mut controllers = Vec::new();
        let copied = controllers
            .try_reserve_exact(count)
            .map_err(|_| NetworkError::OutOfMemory);
        if copied.is_ok() {
            // SAFETY: firmware returned `count` handles at `buffer`.
            controllers.extend_from_slice(unsafe { core::slice::from_raw_parts(buffer, count) });
        }
        // SAFETY: the handle buffer was allocated from pool by firmware.
        unsafe {
            (self.bs.free_pool)(buffer as *mut c_void);
        }
        copied?;
        Ok(controllers)
    }

    /// Query the link type through a short-lived managed network child.
    fn is_ethernet(&self, controller: Handle) -> Result<bool> {
        // SAFETY: `controller` came from the handle enumeration.
        let child: ServiceChild<ManagedNetworkProtocol> = unsafe {
            ServiceChild::create(
                self.bs,
                self.image,
                controller,
                &MNP_SERVICE_BINDING_GUID,
                &MNP_PROTOCOL_GUID,
            )?
        };
        let mnp = child.interface();

        let mut mode = SimpleNetworkMode::zeroed();
        // SAFETY: `mnp` is open on the child, which outlives the call.
        let st = unsafe { ((*mnp).get_mode_data)(mnp, ptr::null_mut(), &mut mode) };
        if st != status::NOT_STARTED {
            status::check(st, NetworkError::ProtocolNotAvailable)?;
        }
        Ok(mode.is_ethernet())
    }

    /// Switch `controller` to DHCP when it has no station address.
    fn enable_dhcp(&self, nic: &Nic, controller: Handle) -> Result<()> {
        let mut raw: *mut c_void = ptr::null_mut();
        // SAFETY: `controller` came from the handle enumeration.
        let st = unsafe { (self.bs.handle_protocol)(controller, &IP4_CONFIG2_PROTOCOL_GUID, &mut raw) };
        status::check(st, NetworkError::ProtocolNotAvailable)?;
        if raw.is_null() {
            return Err(NetworkError::ProtocolNotAvailable);
        }
        let config = raw as *mut Ip4Config2Protocol;

        // SAFETY: `config` is the interface's IPv4 configuration protocol.
        let station = unsafe { station_address(config)? };

        let mut policy = Ip4Config2Policy::default();
        let mut size = size_of::<Ip4Config2Policy>();
        // SAFETY: as above; `policy` is large enough for the data item.
        let st = unsafe {
            ((*config).get_data)(
                config,
                Ip4Config2DataType::Policy,
                &mut size,
                &mut policy as *mut Ip4Config2Policy as *mut c_void,
            )
        };
        status::check(st, NetworkError::InitializationFailed)?;

        debug!("{}: IP={} Policy={}", nic.name, station, policy.0);

        if needs_dhcp(station, policy) {
            let dhcp = Ip4Config2Policy::DHCP;
            // SAFETY: as above.
            let st = unsafe {
                ((*config).set_data)(
                    config,
                    Ip4Config2DataType::Policy,
                    size_of::<Ip4Config2Policy>(),
                    &dhcp as *const Ip4Config2Policy as *const c_void,
                )
            };
            status::check(st, NetworkError::InitializationFailed)?;
            info!("{}: switched to DHCP", nic.name);
        }
        Ok(())
    }
}

/// Read the station address from the interface info data item.
///
/// # Safety
///
/// `config` must point to an IPv4 configuration protocol instance.
unsafe fn station_address(config: *mut Ip4Config2Protocol) -> Result<Ipv4Address> {
    let mut size = 0usize;
    let st = ((*config).get_data)(
        config,
        Ip4Config2DataType::InterfaceInfo,
        &mut size,
        ptr::null_mut(),
    );
    if st != status::BUFFER_TOO_SMALL {
        status::check(st, NetworkError::InitializationFailed)?;
        return Err(NetworkError::InitializationFailed);
    }
    if size < size_of::<Ip4Config2InterfaceInfo>() {
        return Err(NetworkError::InitializationFailed);
    }

    // u64 words keep the pointer-bearing struct aligned.
    let words = size.div_ceil(size_of::<u64>());
    let mut info: Vec<u64> = Vec::new();
    info.try_reserve_exact(words)
        .map_err(|_| NetworkError::OutOfMemory)?;
    info.resize(words, 0);

    let st = ((*config).get_data)(
        config,
        Ip4Config2DataType::InterfaceInfo,
        &mut size,
        info.as_mut_ptr() as *mut c_void,
    );
    status::check(st, NetworkError::InitializationFailed)?;

    let header = ptr::read(info.as_ptr() as *const Ip4Config2InterfaceInfo);
    Ok(Ipv4Address(header.station_address))
}

impl InterfaceProvider for UefiPlatform {
    type Session = UefiSession;

    fn interfaces(&mut self) -> Result<Vec<Nic>> {
        self.controllers = self.locate_controllers()?;
        debug!("{} network interfaces found", self.controllers.len());

        let mut nics = Vec::new();
        nics.try_reserve_exact(self.controllers.len())
            .map_err(|_| NetworkError::OutOfMemory)?;
        for (index, &controller) in self.controllers.iter().enumerate() {
            match self.is_ethernet(controller) {
                Ok(ethernet) => nics.push(Nic::new(index, ethernet)),
                Err(e) => warn!(
                    "Failed to get the name of network interface {}: {}",
                    index, e
                ),
            }
        }
        Ok(nics)
    }

    fn prepare_interface(&mut self, nic: &Nic) -> Result<()> {
        let controller = self.controller(nic)?;
        self.enable_dhcp(nic, controller)
    }

    fn open_session(&mut self, nic: &Nic) -> Result<UefiSession> {
        let controller = self.controller(nic)?;
        // SAFETY: `controller` came from the handle enumeration and the
        // image handle was supplied at construction.
        unsafe { UefiSession::open(self.bs, self.image, controller) }
    }
}
