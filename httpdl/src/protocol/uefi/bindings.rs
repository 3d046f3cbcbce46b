//! UEFI type definitions for the HTTP download path.
//!
//! Covers the EFI HTTP protocol and its service binding, the IPv4
//! configuration protocol used to switch an interface to DHCP, the managed
//! network protocol's mode query used to name interfaces, and the boot
//! services entries those need.
//!
//! Based on UEFI Specification 2.10 sections 7, 10.1, 24, 28.5 and 29.7.
//!
//! # Safety
//!
//! All FFI types in this module are `#[repr(C)]` for UEFI ABI compatibility.
//! Function pointers use `extern "efiapi"` calling convention. Values the
//! firmware writes back (status codes, policies) are plain integers so that
//! an unexpected value is never an invalid enum.

use core::ffi::c_void;

// ==================== Basic Types ====================

/// UEFI Status code.
pub type Status = usize;

/// UEFI Handle (opaque pointer).
pub type Handle = *mut c_void;

/// UEFI Event (opaque pointer for async operations).
pub type Event = *mut c_void;

/// Event notification function.
pub type EventNotify = unsafe extern "efiapi" fn(event: Event, context: *mut c_void);

/// Status code constants.
pub mod status {
    use super::Status;
    use crate::error::{NetworkError, Result};

    const ERROR_BIT: Status = 0x8000_0000_0000_0000;

    /// Operation completed successfully.
    pub const SUCCESS: Status = 0;

    /// Invalid parameter was passed.
    pub const INVALID_PARAMETER: Status = ERROR_BIT | 2;

    /// The operation is not supported.
    pub const UNSUPPORTED: Status = ERROR_BIT | 3;

    /// The buffer is too small; the required size was written back.
    pub const BUFFER_TOO_SMALL: Status = ERROR_BIT | 5;

    /// No data pending (an event that has not been signalled).
    pub const NOT_READY: Status = ERROR_BIT | 6;

    /// Out of resources.
    pub const OUT_OF_RESOURCES: Status = ERROR_BIT | 9;

    /// The protocol was not found.
    pub const NOT_FOUND: Status = ERROR_BIT | 14;

    /// A timeout occurred.
    pub const TIMEOUT: Status = ERROR_BIT | 18;

    /// The protocol has not been started.
    pub const NOT_STARTED: Status = ERROR_BIT | 19;

    /// The operation was aborted.
    pub const ABORTED: Status = ERROR_BIT | 21;

    /// An HTTP error occurred during the network operation.
    pub const HTTP_ERROR: Status = ERROR_BIT | 35;

    /// Check if status indicates success.
    #[inline]
    pub const fn is_success(status: Status) -> bool {
        status == SUCCESS
    }

    /// Check if status indicates an error.
    #[inline]
    pub const fn is_error(status: Status) -> bool {
        (status & ERROR_BIT) != 0
    }

    /// Translate a firmware status into the crate error taxonomy.
    ///
    /// Resource and timeout statuses keep their meaning; anything else
    /// becomes `fallback`, the error of the operation that failed.
    pub fn check(status: Status, fallback: NetworkError) -> Result<()> {
        match status {
            SUCCESS => Ok(()),
            OUT_OF_RESOURCES => Err(NetworkError::OutOfMemory),
            TIMEOUT => Err(NetworkError::Timeout),
            _ => Err(fallback),
        }
    }
}

// ==================== GUID ====================

/// UEFI Globally Unique Identifier.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    /// Create a GUID from component values.
    pub const fn from_values(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self { data1, data2, data3, data4 }
    }
}

/// EFI HTTP Protocol GUID.
pub const HTTP_PROTOCOL_GUID: Guid = Guid::from_values(
    0x7a59b29b,
    0x910b,
    0x4171,
    [0x82, 0x42, 0xa8, 0x5a, 0x0d, 0xf2, 0x5b, 0x5b],
);

/// EFI HTTP Service Binding Protocol GUID.
pub const HTTP_SERVICE_BINDING_GUID: Guid = Guid::from_values(
    0xbdc8e6af,
    0xd9bc,
    0x4379,
    [0xa7, 0x2a, 0xe0, 0xc4, 0xe7, 0x5d, 0xae, 0x1c],
);

/// EFI Managed Network Service Binding Protocol GUID.
///
/// Every network interface carries one; enumeration keys on it.
pub const MNP_SERVICE_BINDING_GUID: Guid = Guid::from_values(
    0xf36ff770,
    0xa7e1,
    0x42cf,
    [0x9e, 0xd2, 0x56, 0xf0, 0xf2, 0x71, 0xf4, 0x4c],
);

/// EFI Managed Network Protocol GUID.
pub const MNP_PROTOCOL_GUID: Guid = Guid::from_values(
    0x7ab33a91,
    0xace5,
    0x4326,
    [0xb5, 0x72, 0xe7, 0xee, 0x33, 0xd3, 0x9f, 0x16],
);

/// EFI IPv4 Configuration II Protocol GUID.
pub const IP4_CONFIG2_PROTOCOL_GUID: Guid = Guid::from_values(
    0x5b446ed1,
    0xe30b,
    0x4faa,
    [0x87, 0x1a, 0x36, 0x54, 0xec, 0xa3, 0x60, 0x80],
);

// ==================== Boot Services ====================

/// UEFI Boot Services table (partial definition).
///
/// Entries this crate calls are typed; the rest are placeholders keeping the
/// table layout.
#[repr(C)]
pub struct BootServices {
    _header: [u8; 24],
    // Task Priority Services
    _raise_tpl: usize,
    _restore_tpl: usize,
    // Memory Services
    _allocate_pages: usize,
    _free_pages: usize,
    _get_memory_map: usize,
    _allocate_pool: usize,
    pub free_pool: unsafe extern "efiapi" fn(buffer: *mut c_void) -> Status,
    // Event & Timer Services
    pub create_event: unsafe extern "efiapi" fn(
        event_type: u32,
        notify_tpl: usize,
        notify_function: Option<EventNotify>,
        notify_context: *mut c_void,
        event: *mut Event,
    ) -> Status,
    pub set_timer: unsafe extern "efiapi" fn(event: Event, timer_type: u32, trigger_time: u64) -> Status,
    _wait_for_event: usize,
    _signal_event: usize,
    pub close_event: unsafe extern "efiapi" fn(event: Event) -> Status,
    pub check_event: unsafe extern "efiapi" fn(event: Event) -> Status,
    // Protocol Handler Services
    _install_protocol_interface: usize,
    _reinstall_protocol_interface: usize,
    _uninstall_protocol_interface: usize,
    pub handle_protocol: unsafe extern "efiapi" fn(
        handle: Handle,
        protocol: *const Guid,
        interface: *mut *mut c_void,
    ) -> Status,
    _reserved: usize,
    _register_protocol_notify: usize,
    _locate_handle: usize,
    _locate_device_path: usize,
    _install_configuration_table: usize,
    // Image Services (skipped)
    _load_image: usize,
    _start_image: usize,
    _exit: usize,
    _unload_image: usize,
    _exit_boot_services: usize,
    // Miscellaneous Services (skipped)
    _get_next_monotonic_count: usize,
    _stall: usize,
    _set_watchdog_timer: usize,
    // Driver Support Services (skipped)
    _connect_controller: usize,
    _disconnect_controller: usize,
    // Open and Close Protocol Services
    pub open_protocol: unsafe extern "efiapi" fn(
        handle: Handle,
        protocol: *const Guid,
        interface: *mut *mut c_void,
        agent_handle: Handle,
        controller_handle: Handle,
        attributes: u32,
    ) -> Status,
    pub close_protocol: unsafe extern "efiapi" fn(
        handle: Handle,
        protocol: *const Guid,
        agent_handle: Handle,
        controller_handle: Handle,
    ) -> Status,
    _open_protocol_information: usize,
    // Library Services
    _protocols_per_handle: usize,
    pub locate_handle_buffer: unsafe extern "efiapi" fn(
        search_type: usize,
        protocol: *const Guid,
        search_key: *const c_void,
        no_handles: *mut usize,
        buffer: *mut *mut Handle,
    ) -> Status,
    _locate_protocol: usize,
}

/// Search type for LocateHandleBuffer: ByProtocol.
pub const LOCATE_HANDLE_BY_PROTOCOL: usize = 2;

/// Open protocol attribute: GET_PROTOCOL.
pub const OPEN_PROTOCOL_GET_PROTOCOL: u32 = 0x00000002;

/// Event type: timer.
pub const EVT_TIMER: u32 = 0x8000_0000;
/// Event type: notify function queued when signalled.
pub const EVT_NOTIFY_SIGNAL: u32 = 0x0000_0200;

/// Task priority level for notification functions.
pub const TPL_CALLBACK: usize = 8;

/// SetTimer type: cancel a pending trigger.
pub const TIMER_CANCEL: u32 = 0;
/// SetTimer type: fire once after the trigger time.
pub const TIMER_RELATIVE: u32 = 2;

/// SetTimer trigger times are in 100 ns units.
pub const TIMER_TICKS_PER_MS: u64 = 10_000;

// ==================== HTTP Types ====================

/// HTTP version (`EFI_HTTP_VERSION`).
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpVersion {
    Http10 = 0,
    #[default]
    Http11 = 1,
    Unsupported = 2,
}

/// HTTP request method.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get = 0,
    Post = 1,
    Patch = 2,
    Options = 3,
    Connect = 4,
    Head = 5,
    Put = 6,
    Delete = 7,
    Trace = 8,
}

impl HttpMethod {
    /// Convert from our HttpMethod type to UEFI representation.
    pub fn from_types_method(method: crate::types::HttpMethod) -> Self {
        match method {
            crate::types::HttpMethod::Get => Self::Get,
            crate::types::HttpMethod::Head => Self::Head,
        }
    }
}

/// HTTP status as reported by firmware (`EFI_HTTP_STATUS_CODE`).
///
/// This is an index into the firmware's status table, not the numeric
/// code. Use [`HttpStatusCode::to_code`] to translate.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HttpStatusCode(pub u32);

/// Numeric codes of the 3xx entries, in table order.
const REDIRECT_CODES: [u16; 7] = [300, 301, 302, 303, 304, 305, 307];

impl HttpStatusCode {
    /// Status not recognised by the firmware (or not yet received).
    pub const UNSUPPORTED: Self = Self(0);

    /// Numeric HTTP status code, or `None` for an unsupported entry.
    pub const fn to_code(self) -> Option<u16> {
        let index = self.0;
        let code = match index {
            1..=2 => 99 + index as u16,
            3..=9 => 197 + index as u16,
            10..=16 => REDIRECT_CODES[(index - 10) as usize],
            17..=34 => 383 + index as u16,
            35..=40 => 465 + index as u16,
            41 => 308,
            _ => return None,
        };
        Some(code)
    }
}

// ==================== HTTP Configuration ====================

/// IPv4 access point configuration.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct HttpIpv4AccessPoint {
    /// Use default (DHCP) address.
    pub use_default_address: bool,
    /// Local IPv4 address.
    pub local_address: [u8; 4],
    /// Subnet mask.
    pub local_subnet: [u8; 4],
    /// Local port (0 for any).
    pub local_port: u16,
}

impl Default for HttpIpv4AccessPoint {
    fn default() -> Self {
        Self {
            use_default_address: true,
            local_address: [0, 0, 0, 0],
            local_subnet: [0, 0, 0, 0],
            local_port: 0,
        }
    }
}

/// HTTP access point. Only the IPv4 node is used.
#[repr(C)]
pub union HttpAccessPoint {
    pub ipv4_node: *mut HttpIpv4AccessPoint,
    pub ipv6_node: *mut c_void,
}

/// HTTP configuration data.
#[repr(C)]
pub struct HttpConfigData {
    /// HTTP version to use.
    pub http_version: HttpVersion,
    /// Timeout in milliseconds (0 = no timeout).
    pub timeout_millisec: u32,
    /// True if using IPv6.
    pub local_addr_is_ipv6: bool,
    /// Network access point.
    pub access_point: HttpAccessPoint,
}

// ==================== HTTP Messages ====================

/// HTTP request data.
#[repr(C)]
pub struct HttpRequestData {
    /// HTTP method.
    pub method: HttpMethod,
    /// URL as null-terminated UTF-16 string.
    pub url: *const u16,
}

/// HTTP response data.
#[repr(C)]
pub struct HttpResponseData {
    /// HTTP status, as a table index.
    pub status_code: HttpStatusCode,
}

/// HTTP header (name-value pair).
#[repr(C)]
pub struct HttpHeader {
    /// Header field name (null-terminated ASCII).
    pub field_name: *const u8,
    /// Header field value (null-terminated ASCII).
    pub field_value: *const u8,
}

/// Union for request or response data in an HTTP message.
#[repr(C)]
pub union HttpMessageData {
    pub request: *mut HttpRequestData,
    pub response: *mut HttpResponseData,
}

/// HTTP message (request or response).
#[repr(C)]
pub struct HttpMessage {
    /// Request or response data. A null response pointer asks for body
    /// data only.
    pub data: HttpMessageData,
    /// Number of headers.
    pub header_count: usize,
    /// Array of headers.
    pub headers: *mut HttpHeader,
    /// Body length in bytes.
    pub body_length: usize,
    /// Body data.
    pub body: *mut u8,
}

/// HTTP token for async operations.
#[repr(C)]
pub struct HttpToken {
    /// Event to signal on completion.
    pub event: Event,
    /// Status after completion.
    pub status: Status,
    /// HTTP message.
    pub message: *mut HttpMessage,
}

// ==================== Protocol Definitions ====================

/// Service Binding Protocol for creating child instances.
#[repr(C)]
pub struct ServiceBindingProtocol {
    /// Create a child handle with the protocol.
    pub create_child: unsafe extern "efiapi" fn(
        this: *mut ServiceBindingProtocol,
        child_handle: *mut Handle,
    ) -> Status,

    /// Destroy a child handle.
    pub destroy_child: unsafe extern "efiapi" fn(
        this: *mut ServiceBindingProtocol,
        child_handle: Handle,
    ) -> Status,
}

/// EFI HTTP Protocol interface.
#[repr(C)]
pub struct HttpProtocol {
    /// Get current configuration.
    pub get_mode_data: unsafe extern "efiapi" fn(
        this: *mut HttpProtocol,
        config_data: *mut HttpConfigData,
    ) -> Status,

    /// Configure the HTTP instance. Null resets it.
    pub configure: unsafe extern "efiapi" fn(
        this: *mut HttpProtocol,
        config_data: *const HttpConfigData,
    ) -> Status,

    /// Queue an HTTP request.
    pub request: unsafe extern "efiapi" fn(
        this: *mut HttpProtocol,
        token: *mut HttpToken,
    ) -> Status,

    /// Cancel a pending request or response.
    pub cancel: unsafe extern "efiapi" fn(
        this: *mut HttpProtocol,
        token: *mut HttpToken,
    ) -> Status,

    /// Queue to receive HTTP response.
    pub response: unsafe extern "efiapi" fn(
        this: *mut HttpProtocol,
        token: *mut HttpToken,
    ) -> Status,

    /// Poll for completion.
    pub poll: unsafe extern "efiapi" fn(
        this: *mut HttpProtocol,
    ) -> Status,
}

// ==================== IPv4 Configuration ====================

/// `EFI_IP4_CONFIG2_DATA_TYPE`.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ip4Config2DataType {
    InterfaceInfo = 0,
    Policy = 1,
    ManualAddress = 2,
    Gateway = 3,
    DnsServer = 4,
}

/// `EFI_IP4_CONFIG2_POLICY`, as read from or written to firmware.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ip4Config2Policy(pub u32);

impl Ip4Config2Policy {
    pub const STATIC: Self = Self(0);
    pub const DHCP: Self = Self(1);
}

/// Length of the interface name field, in UTF-16 units.
pub const IP4_CONFIG2_INTERFACE_INFO_NAME_SIZE: usize = 32;

/// Fixed part of `EFI_IP4_CONFIG2_INTERFACE_INFO`. The route table follows
/// it in the same allocation.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Ip4Config2InterfaceInfo {
    pub name: [u16; IP4_CONFIG2_INTERFACE_INFO_NAME_SIZE],
    pub if_type: u8,
    pub hw_address_size: u32,
    pub hw_address: [u8; 32],
    pub station_address: [u8; 4],
    pub subnet_mask: [u8; 4],
    pub route_table_size: u32,
    pub route_table: *mut c_void,
}

/// EFI IPv4 Configuration II Protocol interface.
#[repr(C)]
pub struct Ip4Config2Protocol {
    pub set_data: unsafe extern "efiapi" fn(
        this: *mut Ip4Config2Protocol,
        data_type: Ip4Config2DataType,
        data_size: usize,
        data: *const c_void,
    ) -> Status,

    /// Read a data item. With a too-small buffer, reports
    /// `BUFFER_TOO_SMALL` and writes the required size back.
    pub get_data: unsafe extern "efiapi" fn(
        this: *mut Ip4Config2Protocol,
        data_type: Ip4Config2DataType,
        data_size: *mut usize,
        data: *mut c_void,
    ) -> Status,

    _register_data_notify: usize,
    _unregister_data_notify: usize,
}

// ==================== Managed Network ====================

/// Interface type of an Ethernet device (`NET_IFTYPE_ETHERNET`).
pub const IF_TYPE_ETHERNET: u8 = 1;

/// `EFI_MAC_ADDRESS`.
pub type MacAddress = [u8; 32];

/// Maximum number of multicast filters in the mode data.
pub const MAX_MCAST_FILTER_CNT: usize = 16;

/// `EFI_SIMPLE_NETWORK_MODE`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SimpleNetworkMode {
    pub state: u32,
    pub hw_address_size: u32,
    pub media_header_size: u32,
    pub max_packet_size: u32,
    pub nv_ram_size: u32,
    pub nv_ram_access_size: u32,
    pub receive_filter_mask: u32,
    pub receive_filter_setting: u32,
    pub max_mcast_filter_count: u32,
    pub mcast_filter_count: u32,
    pub mcast_filter: [MacAddress; MAX_MCAST_FILTER_CNT],
    pub current_address: MacAddress,
    pub broadcast_address: MacAddress,
    pub permanent_address: MacAddress,
    pub if_type: u8,
    pub mac_address_changeable: bool,
    pub multiple_tx_supported: bool,
    pub media_present_supported: bool,
    pub media_present: bool,
}

impl SimpleNetworkMode {
    /// All-zero mode data, to be filled in by firmware.
    pub const fn zeroed() -> Self {
        Self {
            state: 0,
            hw_address_size: 0,
            media_header_size: 0,
            max_packet_size: 0,
            nv_ram_size: 0,
            nv_ram_access_size: 0,
            receive_filter_mask: 0,
            receive_filter_setting: 0,
            max_mcast_filter_count: 0,
            mcast_filter_count: 0,
            mcast_filter: [[0; 32]; MAX_MCAST_FILTER_CNT],
            current_address: [0; 32],
            broadcast_address: [0; 32],
            permanent_address: [0; 32],
            if_type: 0,
            mac_address_changeable: false,
            multiple_tx_supported: false,
            media_present_supported: false,
            media_present: false,
        }
    }

    pub fn is_ethernet(&self) -> bool {
        self.if_type == IF_TYPE_ETHERNET
    }
}

/// EFI Managed Network Protocol interface (mode query only).
#[repr(C)]
pub struct ManagedNetworkProtocol {
    /// Read the current configuration and the underlying SNP mode.
    /// Either output pointer may be null.
    pub get_mode_data: unsafe extern "efiapi" fn(
        this: *mut ManagedNetworkProtocol,
        mnp_config_data: *mut c_void,
        snp_mode_data: *mut SimpleNetworkMode,
    ) -> Status,
    _configure: usize,
    _mcast_ip_to_mac: usize,
    _groups: usize,
    _transmit: usize,
    _receive: usize,
    _cancel: usize,
    _poll: usize,
}

// ==================== Tests ====================
