//! Reverse DNS.

use std::ffi::CStr;
use std::mem;
use std::net::Ipv4Addr;

const MAX_HOST: usize = 1025; // NI_MAXHOST

/// PTR lookup for `ip`. A missing record is `None`, never an error:
/// plenty of scan targets simply have no reverse entry.
pub async fn reverse_lookup(ip: Ipv4Addr) -> Option<String> {
    tokio::task::spawn_blocking(move || lookup_ptr(ip))
        .await
        .ok()
        .flatten()
}

fn lookup_ptr(ip: Ipv4Addr) -> Option<String> {
    let mut sa: libc::sockaddr_in = unsafe { mem::zeroed() };
    sa.sin_family = libc::AF_INET as libc::sa_family_t;
    sa.sin_addr.s_addr = u32::from_ne_bytes(ip.octets());

    let mut host = [0 as libc::c_char; MAX_HOST];
    let rc = unsafe {
        libc::getnameinfo(
            &sa as *const libc::sockaddr_in as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
            host.as_mut_ptr(),
            host.len() as libc::socklen_t,
            std::ptr::null_mut(),
            0,
            libc::NI_NAMEREQD,
        )
    };
    if rc != 0 {
        return None;
    }

    let name = unsafe { CStr::from_ptr(host.as_ptr()) }
        .to_string_lossy()
        .trim_end_matches('.')
        .to_string();
    if name.is_empty() {
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_never_errors() {
        // PTR data depends on the environment; the contract is only
        // that absent records come back as None.
        let loopback = reverse_lookup(Ipv4Addr::LOCALHOST).await;
        println!("127.0.0.1 reverse: {loopback:?}");

        // TEST-NET-3 is guaranteed unassigned.
        assert_eq!(reverse_lookup(Ipv4Addr::new(203, 0, 113, 254)).await, None);
    }
}
