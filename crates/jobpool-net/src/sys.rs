//! Thin socket syscall wrappers
//!
//! IPv4 stream sockets over raw fds. Every wrapper turns the `-1`/errno
//! convention into `io::Result`; callers own the fds as `OwnedFd`.

use std::io;
use std::mem;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use nix::fcntl::{fcntl, FcntlArg, OFlag};

#[inline]
fn cvt(ret: libc::c_int) -> io::Result<libc::c_int> {
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}

#[inline]
fn cvt_size(ret: libc::ssize_t) -> io::Result<usize> {
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret as usize)
    }
}

fn to_sockaddr(addr: SocketAddrV4) -> libc::sockaddr_in {
    let mut sa: libc::sockaddr_in = unsafe { mem::zeroed() };
    sa.sin_family = libc::AF_INET as libc::sa_family_t;
    sa.sin_port = addr.port().to_be();
    sa.sin_addr.s_addr = u32::from(*addr.ip()).to_be();
    sa
}

fn from_sockaddr(sa: &libc::sockaddr_in) -> SocketAddrV4 {
    SocketAddrV4::new(
        Ipv4Addr::from(u32::from_be(sa.sin_addr.s_addr)),
        u16::from_be(sa.sin_port),
    )
}

fn set_int_opt(fd: RawFd, level: libc::c_int, name: libc::c_int, value: libc::c_int) -> io::Result<()> {
    cvt(unsafe {
        libc::setsockopt(
            fd,
            level,
            name,
            &value as *const _ as *const libc::c_void,
            mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    })?;
    Ok(())
}

/// Create an IPv4 stream socket with `SO_REUSEADDR` and bind it
pub fn bind(addr: SocketAddrV4) -> io::Result<OwnedFd> {
    let raw = cvt(unsafe { libc::socket(libc::AF_INET, libc::SOCK_STREAM | libc::SOCK_CLOEXEC, 0) })?;
    // Safety: `raw` is a fresh descriptor nobody else owns
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };

    set_int_opt(fd.as_raw_fd(), libc::SOL_SOCKET, libc::SO_REUSEADDR, 1)?;

    let sa = to_sockaddr(addr);
    cvt(unsafe {
        libc::bind(
            fd.as_raw_fd(),
            &sa as *const _ as *const libc::sockaddr,
            mem::size_of_val(&sa) as libc::socklen_t,
        )
    })?;
    Ok(fd)
}

pub fn listen(fd: RawFd, backlog: i32) -> io::Result<()> {
    cvt(unsafe { libc::listen(fd, backlog) })?;
    Ok(())
}

/// Accept one connection; the new fd is close-on-exec with `TCP_NODELAY`
pub fn accept(fd: RawFd) -> io::Result<(OwnedFd, SocketAddrV4)> {
    let mut sa: libc::sockaddr_in = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;

    let raw = cvt(unsafe {
        libc::accept4(
            fd,
            &mut sa as *mut _ as *mut libc::sockaddr,
            &mut len,
            libc::SOCK_CLOEXEC,
        )
    })?;
    // Safety: accept4 returned a descriptor we now own
    let client = unsafe { OwnedFd::from_raw_fd(raw) };

    // Best effort; a failure here does not make the connection unusable
    let _ = set_int_opt(client.as_raw_fd(), libc::IPPROTO_TCP, libc::TCP_NODELAY, 1);

    Ok((client, from_sockaddr(&sa)))
}

/// Address the socket is bound to (resolves port 0)
pub fn local_addr(fd: RawFd) -> io::Result<SocketAddrV4> {
    let mut sa: libc::sockaddr_in = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
    cvt(unsafe { libc::getsockname(fd, &mut sa as *mut _ as *mut libc::sockaddr, &mut len) })?;
    Ok(from_sockaddr(&sa))
}

/// Shut down both directions; wakes threads blocked in accept/recv/send
pub fn shutdown(fd: RawFd) -> io::Result<()> {
    cvt(unsafe { libc::shutdown(fd, libc::SHUT_RDWR) })?;
    Ok(())
}

pub fn recv(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    cvt_size(unsafe { libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0) })
}

/// Send without raising SIGPIPE on a closed peer
pub fn send(fd: RawFd, buf: &[u8]) -> io::Result<usize> {
    cvt_size(unsafe {
        libc::send(fd, buf.as_ptr() as *const libc::c_void, buf.len(), libc::MSG_NOSIGNAL)
    })
}

/// Send every byte of `buf`, retrying on partial writes and EINTR
pub fn send_all(fd: RawFd, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match send(fd, buf) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => buf = &buf[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Set or clear `O_NONBLOCK`; returns whether it was set before
pub fn set_nonblocking(fd: RawFd, enable: bool) -> io::Result<bool> {
    let bits = fcntl(fd, FcntlArg::F_GETFL)?;
    let flags = OFlag::from_bits_truncate(bits);
    let was = flags.contains(OFlag::O_NONBLOCK);

    if was != enable {
        let mut next = flags;
        next.set(OFlag::O_NONBLOCK, enable);
        fcntl(fd, FcntlArg::F_SETFL(next))?;
    }
    Ok(was)
}

/// Non-blocking mode for the guard's lifetime, then back to the previous mode
pub struct NonBlocking {
    fd: RawFd,
    restore: bool,
}

impl NonBlocking {
    pub fn enable(fd: RawFd) -> io::Result<Self> {
        let was = set_nonblocking(fd, true)?;
        Ok(Self { fd, restore: !was })
    }
}

impl Drop for NonBlocking {
    fn drop(&mut self) {
        if self.restore {
            let _ = set_nonblocking(self.fd, false);
        }
    }
}
