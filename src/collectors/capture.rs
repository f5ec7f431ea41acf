//! Live packet capture through libpcap (needs CAP_NET_RAW or root). Builds
//! without the `live-capture` feature, or off unix, report `Unsupported`.

use super::{PacketSource, RawPacket};
use crate::error::CaptureError;
use crate::observation::Protocol;
use etherparse::{NetSlice, SlicedPacket};
use std::net::IpAddr;
use std::time::Duration;

/// Upper bound on how long one capture call may block.
pub const MAX_CAPTURE_TIMEOUT: Duration = Duration::from_secs(1);
/// libpcap treats a zero read timeout as "wait forever".
const MIN_CAPTURE_TIMEOUT: Duration = Duration::from_millis(1);

/// Clamp a requested per-call timeout into `[1ms, MAX_CAPTURE_TIMEOUT]`.
pub fn capture_timeout(requested: Duration) -> Duration {
    requested.clamp(MIN_CAPTURE_TIMEOUT, MAX_CAPTURE_TIMEOUT)
}

/// Parse an Ethernet II frame (VLAN tags allowed) carrying IPv4 or IPv6.
/// Anything else, or anything malformed, is `None`.
pub fn parse_ethernet_frame(frame: &[u8]) -> Option<RawPacket> {
    let sliced = SlicedPacket::from_ethernet(frame).ok()?;
    let (src, dst, proto) = match sliced.net.as_ref()? {
        NetSlice::Ipv4(ipv4) => {
            let header = ipv4.header();
            (
                IpAddr::V4(header.source_addr()),
                IpAddr::V4(header.destination_addr()),
                ipv4.payload().ip_number.0,
            )
        }
        NetSlice::Ipv6(ipv6) => {
            let header = ipv6.header();
            (
                IpAddr::V6(header.source_addr()),
                IpAddr::V6(header.destination_addr()),
                ipv6.payload().ip_number.0,
            )
        }
        #[allow(unreachable_patterns)]
        _ => return None,
    };

    Some(RawPacket {
        src,
        dst,
        len: frame.len(),
        protocol: Protocol::from_ip_number(proto),
    })
}

/// Source for when capture is switched off: always empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl PacketSource for NoCapture {
    fn try_capture(&self, _max_count: usize, _timeout: Duration) -> Result<Vec<RawPacket>, CaptureError> {
        Ok(Vec::new())
    }
}

/// libpcap-backed source. The handle is opened on first use and reopened
/// after a read error.
pub struct LiveCapture {
    interface: Option<String>,
    #[cfg(all(unix, feature = "live-capture"))]
    handle: std::sync::Mutex<Option<pcap::Capture<pcap::Active>>>,
}

impl LiveCapture {
    pub fn new(interface: Option<String>) -> Self {
        Self {
            interface,
            #[cfg(all(unix, feature = "live-capture"))]
            handle: std::sync::Mutex::new(None),
        }
    }

    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }
}

impl PacketSource for LiveCapture {
    fn try_capture(&self, max_count: usize, timeout: Duration) -> Result<Vec<RawPacket>, CaptureError> {
        if max_count == 0 {
            return Ok(Vec::new());
        }
        let timeout = capture_timeout(timeout);
        #[cfg(all(unix, feature = "live-capture"))]
        {
            let mut handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());
            let result = pcap_source::capture(&mut handle, self.interface.as_deref(), max_count, timeout);
            if result.is_err() {
                *handle = None;
            }
            result
        }
        #[cfg(not(all(unix, feature = "live-capture")))]
        {
            let _ = timeout;
            Err(CaptureError::Unsupported)
        }
    }
}

#[cfg(all(unix, feature = "live-capture"))]
mod pcap_source {
    use super::parse_ethernet_frame;
    use crate::collectors::RawPacket;
    use crate::error::CaptureError;
    use pcap::{Active, Capture, Device};
    use std::time::{Duration, Instant};

    fn capture_error(e: pcap::Error) -> CaptureError {
        let message = e.to_string();
        let lower = message.to_ascii_lowercase();
        if lower.contains("permission") || lower.contains("not permitted") {
            CaptureError::PermissionDenied(message)
        } else {
            CaptureError::Pcap(message)
        }
    }

    fn open(interface: Option<&str>, timeout: Duration) -> Result<Capture<Active>, CaptureError> {
        let device = match interface {
            Some(name) => Device::from(name),
            None => Device::lookup()
                .map_err(capture_error)?
                .ok_or(CaptureError::NoDevice)?,
        };
        tracing::debug!(device = %device.name, "opening capture handle");
        Capture::from_device(device)
            .map_err(capture_error)?
            .promisc(false)
            .immediate_mode(true)
            .timeout(timeout.as_millis() as i32)
            .open()
            .map_err(capture_error)
    }

    pub(super) fn capture(
        handle: &mut Option<Capture<Active>>,
        interface: Option<&str>,
        max_count: usize,
        timeout: Duration,
    ) -> Result<Vec<RawPacket>, CaptureError> {
        if handle.is_none() {
            *handle = Some(open(interface, timeout)?);
        }
        let Some(cap) = handle.as_mut() else {
            return Ok(Vec::new());
        };

        let deadline = Instant::now() + timeout;
        let mut out = Vec::with_capacity(max_count);
        while out.len() < max_count && Instant::now() < deadline {
            match cap.next_packet() {
                Ok(packet) => {
                    let wire_len = packet.header.len as usize;
                    if let Some(raw) = parse_ethernet_frame(packet.data) {
                        out.push(RawPacket { len: wire_len, ..raw });
                    }
                }
                Err(pcap::Error::TimeoutExpired) => break,
                Err(e) => return Err(capture_error(e)),
            }
        }
        tracing::trace!(count = out.len(), "pcap capture");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use std::time::Instant;

    const ETHERTYPE_IPV4: u16 = 0x0800;
    const ETHERTYPE_IPV6: u16 = 0x86dd;
    const ETHERTYPE_VLAN: u16 = 0x8100;

    fn transport(proto: u8, payload: usize) -> Vec<u8> {
        match proto {
            6 => {
                let mut t = vec![0u8; 20 + payload];
                t[12] = 0x50;
                t
            }
            17 => {
                let mut t = vec![0u8; 8 + payload];
                t[4..6].copy_from_slice(&((8 + payload) as u16).to_be_bytes());
                t
            }
            _ => vec![0u8; payload],
        }
    }

    fn ethernet(ethertype: u16, body: &[u8]) -> Vec<u8> {
        let mut f = vec![0u8; 12];
        f.extend_from_slice(&ethertype.to_be_bytes());
        f.extend_from_slice(body);
        f
    }

    fn ipv4_packet(src: [u8; 4], dst: [u8; 4], proto: u8, payload: usize) -> Vec<u8> {
        let t = transport(proto, payload);
        let mut ip = vec![0u8; 20];
        ip[0] = 0x45;
        ip[2..4].copy_from_slice(&((20 + t.len()) as u16).to_be_bytes());
        ip[8] = 64;
        ip[9] = proto;
        ip[12..16].copy_from_slice(&src);
        ip[16..20].copy_from_slice(&dst);
        ip.extend_from_slice(&t);
        ip
    }

    fn ipv6_packet(src: Ipv6Addr, dst: Ipv6Addr, proto: u8, payload: usize) -> Vec<u8> {
        let t = transport(proto, payload);
        let mut ip = vec![0u8; 40];
        ip[0] = 0x60;
        ip[4..6].copy_from_slice(&(t.len() as u16).to_be_bytes());
        ip[6] = proto;
        ip[7] = 64;
        ip[8..24].copy_from_slice(&src.octets());
        ip[24..40].copy_from_slice(&dst.octets());
        ip.extend_from_slice(&t);
        ip
    }

    #[test]
    fn parses_ipv4_tcp() {
        let frame = ethernet(ETHERTYPE_IPV4, &ipv4_packet([192, 168, 1, 9], [142, 250, 4, 4], 6, 100));
        let p = parse_ethernet_frame(&frame).unwrap();
        assert_eq!(p.src, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 9)));
        assert_eq!(p.dst, IpAddr::V4(Ipv4Addr::new(142, 250, 4, 4)));
        assert_eq!(p.protocol, Protocol::Tcp);
        assert_eq!(p.len, 14 + 20 + 20 + 100);
    }

    #[test]
    fn parses_vlan_tagged_udp() {
        let mut body = vec![0x00, 0x0a];
        body.extend_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
        body.extend_from_slice(&ipv4_packet([10, 0, 0, 2], [8, 8, 8, 8], 17, 4));
        let frame = ethernet(ETHERTYPE_VLAN, &body);
        let p = parse_ethernet_frame(&frame).unwrap();
        assert_eq!(p.protocol, Protocol::Udp);
        assert_eq!(p.src.to_string(), "10.0.0.2");
    }

    #[test]
    fn parses_ipv6() {
        let src: Ipv6Addr = "fe80::1".parse().unwrap();
        let dst: Ipv6Addr = "2001:db8::2".parse().unwrap();
        let frame = ethernet(ETHERTYPE_IPV6, &ipv6_packet(src, dst, 6, 0));
        let p = parse_ethernet_frame(&frame).unwrap();
        assert_eq!(p.src, IpAddr::V6(src));
        assert_eq!(p.dst, IpAddr::V6(dst));
        assert_eq!(p.protocol, Protocol::Tcp);
    }

    #[test]
    fn ignores_non_ip_and_truncated() {
        let arp = ethernet(0x0806, &[0u8; 46]);
        assert!(parse_ethernet_frame(&arp).is_none());
        assert!(parse_ethernet_frame(&[0u8; 10]).is_none());

        let short = ethernet(ETHERTYPE_IPV4, &ipv4_packet([1, 1, 1, 1], [2, 2, 2, 2], 6, 0));
        assert!(parse_ethernet_frame(&short[..20]).is_none());
    }

    #[test]
    fn timeout_is_clamped_to_one_second() {
        assert_eq!(capture_timeout(Duration::from_secs(30)), MAX_CAPTURE_TIMEOUT);
        assert_eq!(capture_timeout(Duration::MAX), MAX_CAPTURE_TIMEOUT);
        assert_eq!(capture_timeout(Duration::from_millis(100)), Duration::from_millis(100));
        assert_eq!(capture_timeout(Duration::ZERO), MIN_CAPTURE_TIMEOUT);
    }

    #[test]
    fn live_capture_returns_within_bound() {
        let cap = LiveCapture::new(Some("rakshak-no-such-if0".into()));
        let started = Instant::now();
        let result = cap.try_capture(1, Duration::from_secs(30));
        assert!(started.elapsed() < MAX_CAPTURE_TIMEOUT + Duration::from_millis(500));
        assert!(result.is_err());
    }

    #[test]
    fn zero_count_is_empty_without_opening() {
        let cap = LiveCapture::new(Some("rakshak-no-such-if0".into()));
        assert!(cap.try_capture(0, Duration::from_secs(30)).unwrap().is_empty());
    }

    #[test]
    fn no_capture_is_empty() {
        let out = NoCapture.try_capture(5, Duration::from_millis(10)).unwrap();
        assert!(out.is_empty());
    }
}
