//! Classic-BPF scan filter.
//!
//! Attached to the AF_PACKET receive socket so only frames that can be
//! replies to our probes cross the kernel/user boundary. Packet layout
//! assumed by the offsets (Ethernet frame + IPv4 with IHL=5):
//!
//! ```text
//! [12:14]  EtherType    -> must be 0x0800 (IPv4)
//! [23]     IP Protocol  -> must be 0x06   (TCP)
//! [36:38]  TCP DstPort  -> must be >= min_port
//! [47]     TCP Flags    -> RST set, or both SYN and ACK set
//! ```
//!
//! Frames carrying IP options (IHL > 5) shift the TCP offsets and fall
//! through the port/flag checks; they are dropped. SYN-ACK and RST
//! replies from common stacks never carry IP options.

use std::io;
use std::os::fd::RawFd;

/// Bottom of the ephemeral source-port range the scanner draws from.
/// The filter rejects anything below it.
pub const EPHEMERAL_PORT_MIN: u16 = 49152;

// Classic BPF opcodes used by the program.
const LDH_ABS: u16 = 0x28; // A <- half-word at absolute offset
const LDB_ABS: u16 = 0x30; // A <- byte at absolute offset
const JEQ: u16 = 0x15; // jump if A == k
const JGE: u16 = 0x35; // jump if A >= k
const JSET: u16 = 0x45; // jump if A & k != 0
const AND: u16 = 0x54; // A <- A & k
const RET: u16 = 0x06; // accept k bytes (0 = drop)

const fn op(code: u16, jt: u8, jf: u8, k: u32) -> libc::sock_filter {
    libc::sock_filter { code, jt, jf, k }
}

/// The scan filter program: accept IPv4/TCP frames whose destination
/// port is at least `min_port` and whose flags are RST or SYN+ACK.
pub(crate) fn scan_filter(min_port: u16) -> [libc::sock_filter; 12] {
    [
        // [0] load EtherType
        op(LDH_ABS, 0, 0, 12),
        // [1] IPv4, else drop
        op(JEQ, 0, 9, 0x0800),
        // [2] load IP protocol
        op(LDB_ABS, 0, 0, 23),
        // [3] TCP, else drop
        op(JEQ, 0, 7, 0x06),
        // [4] load TCP destination port
        op(LDH_ABS, 0, 0, 36),
        // [5] in the ephemeral range, else drop
        op(JGE, 0, 5, min_port as u32),
        // [6] load TCP flags
        op(LDB_ABS, 0, 0, 47),
        // [7] RST bit set -> accept
        op(JSET, 2, 0, 0x04),
        // [8][9] both SYN and ACK set -> accept, else drop
        op(AND, 0, 0, 0x12),
        op(JEQ, 0, 1, 0x12),
        // [10] accept
        op(RET, 0, 0, 0xffff),
        // [11] drop
        op(RET, 0, 0, 0),
    ]
}

/// Attach the scan filter to `fd` via SO_ATTACH_FILTER.
pub(crate) fn attach_scan_filter(fd: RawFd, min_port: u16) -> io::Result<()> {
    let mut filter = scan_filter(min_port);
    let prog = libc::sock_fprog {
        len: filter.len() as u16,
        filter: filter.as_mut_ptr(),
    };

    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_ATTACH_FILTER,
            &prog as *const libc::sock_fprog as *const libc::c_void,
            std::mem::size_of::<libc::sock_fprog>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
