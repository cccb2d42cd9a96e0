//! Output file written through POSIX AIO
//!
//! Each `write()` submits one `aio_write` at the current end of what was
//! already submitted, then a loop task polls `aio_error` until the request
//! completes. Control blocks live in an in-order log until the kernel
//! reports completion, so they are never freed under a pending request.
use std::cell::{Cell, RefCell, UnsafeCell};
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::mem;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr;
use std::rc::Rc;

use crate::error::Error;
use crate::scheduler::Handle;


// glibc before 2.34 keeps the aio functions in librt
#[link(name = "rt")]
extern "C" {}


/// A submitted write and the buffer it reads from
///
/// The control block is only touched through raw pointers after
/// submission, the AIO implementation updates it concurrently.
struct AioRequest {
    cb: UnsafeCell<libc::aiocb>,
    data: Vec<u8>,
    done: Cell<bool>,
}

struct Shared {
    file: File,
    offset: u64,
    outstanding: VecDeque<Rc<AioRequest>>,
}

/// Output file accepting asynchronous writes
///
/// Writes land one after another in submission order.
pub struct OutFileStream {
    shared: Rc<RefCell<Shared>>,
    handle: Handle,
}

impl AioRequest {
    fn new(fd: libc::c_int, offset: u64, data: Vec<u8>) -> Rc<AioRequest> {
        let req = Rc::new(AioRequest {
            cb: UnsafeCell::new(unsafe { mem::zeroed() }),
            data: data,
            done: Cell::new(false),
        });
        unsafe {
            let cb = &mut *req.cb.get();
            cb.aio_fildes = fd;
            cb.aio_offset = offset as libc::off_t;
            cb.aio_buf = req.data.as_ptr() as *mut libc::c_void;
            cb.aio_nbytes = req.data.len();
            cb.aio_sigevent.sigev_notify = libc::SIGEV_NONE;
        }
        req
    }
    fn submit(&self) -> io::Result<()> {
        if unsafe { libc::aio_write(self.cb.get()) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
    /// Returns `None` while the request is in progress
    fn check(&self) -> Option<io::Result<usize>> {
        let status = unsafe { libc::aio_error(self.cb.get()) };
        if status == libc::EINPROGRESS {
            return None;
        }
        // Must be called exactly once to release the request
        let ret = unsafe { libc::aio_return(self.cb.get()) };
        self.done.set(true);
        if status != 0 {
            return Some(Err(io::Error::from_raw_os_error(status)));
        }
        if ret < 0 {
            return Some(Err(io::Error::last_os_error()));
        }
        Some(Ok(ret as usize))
    }
    /// Blocks until the request is not in progress any more
    fn wait(&self) {
        let list = [self.cb.get() as *const libc::aiocb];
        while !self.done.get() {
            let status = unsafe { libc::aio_error(self.cb.get()) };
            if status != libc::EINPROGRESS {
                unsafe { libc::aio_return(self.cb.get()) };
                self.done.set(true);
                break;
            }
            unsafe { libc::aio_suspend(list.as_ptr(), 1, ptr::null()) };
        }
    }
}

impl Shared {
    /// Drops the completed prefix of the log
    fn collect(&mut self) {
        while self.outstanding.front().map_or(false, |r| r.done.get()) {
            self.outstanding.pop_front();
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        for req in self.outstanding.drain(..) {
            req.wait();
        }
    }
}

fn open_new(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o644)
        .open(path)
}

fn create_file(path: &Path) -> io::Result<File> {
    match open_new(path) {
        Err(ref e) if e.kind() == io::ErrorKind::AlreadyExists => {
            debug!("removing existing {:?}", path);
            fs::remove_file(path)?;
            open_new(path)
        }
        res => res,
    }
}

impl OutFileStream {
    /// Creates the file, replacing it if it already exists
    pub fn create<P: AsRef<Path>>(handle: &Handle, path: P)
        -> Result<OutFileStream, Error>
    {
        let file = create_file(path.as_ref())
            .map_err(|e| Error::file_init(&e))?;
        Ok(OutFileStream {
            shared: Rc::new(RefCell::new(Shared {
                file: file,
                offset: 0,
                outstanding: VecDeque::new(),
            })),
            handle: handle.clone(),
        })
    }
    /// Offset the next write will be submitted at
    pub fn offset(&self) -> u64 {
        self.shared.borrow().offset
    }
    /// Number of control blocks still kept alive
    pub fn pending(&self) -> usize {
        self.shared.borrow().outstanding.len()
    }
    /// Submits `data` for writing after everything submitted before
    ///
    /// The callback gets the number of bytes the kernel wrote. Submission
    /// failures are reported before this method returns.
    pub fn write<F>(&self, data: Vec<u8>, callback: F)
        where F: FnOnce(Result<usize, Error>) + 'static
    {
        let req = {
            let mut sh = self.shared.borrow_mut();
            let len = data.len() as u64;
            let req = AioRequest::new(sh.file.as_raw_fd(), sh.offset, data);
            if let Err(e) = req.submit() {
                drop(sh);
                debug!("aio_write submission failed: {}", e);
                return callback(Err(Error::write(&e)));
            }
            sh.offset += len;
            sh.outstanding.push_back(req.clone());
            req
        };
        let shared = self.shared.clone();
        let mut callback = Some(callback);
        self.handle.post(move || {
            let result = match req.check() {
                None => return false,
                Some(Ok(n)) => {
                    trace!("wrote {} bytes to file", n);
                    Ok(n)
                }
                Some(Err(e)) => Err(Error::write(&e)),
            };
            shared.borrow_mut().collect();
            if let Some(cb) = callback.take() {
                cb(result);
            }
            true
        });
    }
}
