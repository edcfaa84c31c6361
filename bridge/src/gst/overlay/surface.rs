//! Host display surfaces and native window handle resolution.

use parking_lot::{Mutex, RwLock};
use pipebridge_types::GeometryRect;
use raw_window_handle::{
    AppKitWindowHandle, RawWindowHandle, Win32WindowHandle, XcbWindowHandle, XlibWindowHandle,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::c_void;
use std::num::{NonZeroIsize, NonZeroU32};
use std::ptr::NonNull;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tracing::debug;

/// Platform window handle as understood by `GstVideoOverlay` (a `guintptr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(usize);

impl NativeHandle {
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("Display surface has no native window")]
    NoNativeWindow,

    #[error("Display surface was dropped by the host")]
    SurfaceGone,

    #[error("{backend:?} windowing cannot use a {found} window handle")]
    BackendMismatch {
        backend: WindowingBackend,
        found: &'static str,
    },
}

/// Callback invoked with the surface's current geometry on every redraw or
/// resize.
pub type RedrawListener = Arc<dyn Fn(GeometryRect) + Send + Sync>;

/// Keeps a redraw/resize subscription alive; unsubscribes on drop.
pub struct SurfaceSubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl SurfaceSubscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for SurfaceSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for SurfaceSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceSubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// A host widget that video can be composited into.
///
/// The bridge only holds a weak reference; the host owns the surface.
pub trait DisplaySurface: Send + Sync {
    /// Make sure the widget is backed by its own native window.
    ///
    /// Returns false if that is impossible, in which case no overlay can be
    /// bound to it.
    fn ensure_native(&self) -> bool {
        true
    }

    /// The platform window backing this surface.
    fn window_handle(&self) -> Result<RawWindowHandle, SurfaceError>;

    /// Current region of the surface.
    fn geometry(&self) -> GeometryRect;

    /// Subscribe to redraw/resize notifications.
    fn subscribe(&self, listener: RedrawListener) -> SurfaceSubscription;
}

/// Windowing system used to turn display surfaces into native handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowingBackend {
    /// Pick by target operating system
    #[default]
    Auto,
    X11,
    Win32,
    Quartz,
}

impl WindowingBackend {
    /// Resolve `Auto` to the backend of the current platform.
    pub fn concrete(self) -> WindowingBackend {
        match self {
            Self::Auto => {
                if cfg!(target_os = "windows") {
                    Self::Win32
                } else if cfg!(target_os = "macos") {
                    Self::Quartz
                } else {
                    Self::X11
                }
            }
            other => other,
        }
    }

    /// The resolver implementing this backend.
    pub fn resolver(self) -> Arc<dyn NativeSurfaceResolver> {
        match self.concrete() {
            Self::Win32 => Arc::new(Win32Resolver),
            Self::Quartz => Arc::new(QuartzResolver),
            Self::X11 | Self::Auto => Arc::new(X11Resolver),
        }
    }
}

impl std::str::FromStr for WindowingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "x11" => Ok(Self::X11),
            "win32" => Ok(Self::Win32),
            "quartz" => Ok(Self::Quartz),
            other => Err(format!("unknown windowing backend: {}", other)),
        }
    }
}

/// Turns a display surface into the native handle a video sink expects.
pub trait NativeSurfaceResolver: Send + Sync {
    fn backend(&self) -> WindowingBackend;

    fn resolve(&self, surface: &dyn DisplaySurface) -> Result<NativeHandle, SurfaceError>;
}

fn handle_kind(raw: &RawWindowHandle) -> &'static str {
    match raw {
        RawWindowHandle::Xlib(_) => "Xlib",
        RawWindowHandle::Xcb(_) => "Xcb",
        RawWindowHandle::Wayland(_) => "Wayland",
        RawWindowHandle::Win32(_) => "Win32",
        RawWindowHandle::AppKit(_) => "AppKit",
        _ => "unsupported",
    }
}

fn native_window(surface: &dyn DisplaySurface) -> Result<RawWindowHandle, SurfaceError> {
    if !surface.ensure_native() {
        return Err(SurfaceError::NoNativeWindow);
    }
    surface.window_handle()
}

/// X11 windows (the XID), from either Xlib or XCB handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct X11Resolver;

impl NativeSurfaceResolver for X11Resolver {
    fn backend(&self) -> WindowingBackend {
        WindowingBackend::X11
    }

    fn resolve(&self, surface: &dyn DisplaySurface) -> Result<NativeHandle, SurfaceError> {
        match native_window(surface)? {
            RawWindowHandle::Xlib(handle) => Ok(NativeHandle::new(handle.window as usize)),
            RawWindowHandle::Xcb(handle) => Ok(NativeHandle::new(handle.window.get() as usize)),
            other => Err(SurfaceError::BackendMismatch {
                backend: WindowingBackend::X11,
                found: handle_kind(&other),
            }),
        }
    }
}

/// Win32 windows (the HWND).
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Resolver;

impl NativeSurfaceResolver for Win32Resolver {
    fn backend(&self) -> WindowingBackend {
        WindowingBackend::Win32
    }

    fn resolve(&self, surface: &dyn DisplaySurface) -> Result<NativeHandle, SurfaceError> {
        match native_window(surface)? {
            RawWindowHandle::Win32(handle) => Ok(NativeHandle::new(handle.hwnd.get() as usize)),
            other => Err(SurfaceError::BackendMismatch {
                backend: WindowingBackend::Win32,
                found: handle_kind(&other),
            }),
        }
    }
}

/// macOS views (the NSView pointer).
#[derive(Debug, Default, Clone, Copy)]
pub struct QuartzResolver;

impl NativeSurfaceResolver for QuartzResolver {
    fn backend(&self) -> WindowingBackend {
        WindowingBackend::Quartz
    }

    fn resolve(&self, surface: &dyn DisplaySurface) -> Result<NativeHandle, SurfaceError> {
        match native_window(surface)? {
            RawWindowHandle::AppKit(handle) => {
                Ok(NativeHandle::new(handle.ns_view.as_ptr() as usize))
            }
            other => Err(SurfaceError::BackendMismatch {
                backend: WindowingBackend::Quartz,
                found: handle_kind(&other),
            }),
        }
    }
}

/// Platform window wrapped by a [`SurfaceDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceWindow {
    Xlib(u64),
    Xcb(u32),
    Win32(isize),
    AppKit(usize),
}

impl SurfaceWindow {
    fn to_raw(self) -> Result<RawWindowHandle, SurfaceError> {
        let raw = match self {
            Self::Xlib(0) => return Err(SurfaceError::NoNativeWindow),
            Self::Xlib(window) => {
                RawWindowHandle::Xlib(XlibWindowHandle::new(window as std::ffi::c_ulong))
            }
            Self::Xcb(window) => RawWindowHandle::Xcb(XcbWindowHandle::new(
                NonZeroU32::new(window).ok_or(SurfaceError::NoNativeWindow)?,
            )),
            Self::Win32(hwnd) => RawWindowHandle::Win32(Win32WindowHandle::new(
                NonZeroIsize::new(hwnd).ok_or(SurfaceError::NoNativeWindow)?,
            )),
            Self::AppKit(view) => RawWindowHandle::AppKit(AppKitWindowHandle::new(
                NonNull::new(view as *mut c_void).ok_or(SurfaceError::NoNativeWindow)?,
            )),
        };
        Ok(raw)
    }
}

#[derive(Default)]
struct ListenerSet {
    next_key: u64,
    listeners: HashMap<u64, RedrawListener>,
}

/// Ready-made [`DisplaySurface`] for hosts.
///
/// The host's GUI code calls [`resize`](Self::resize) from its
/// size-allocate handler and [`redraw`](Self::redraw) from its draw handler.
pub struct SurfaceDescriptor {
    window: SurfaceWindow,
    geometry: RwLock<GeometryRect>,
    listeners: Arc<Mutex<ListenerSet>>,
}

impl SurfaceDescriptor {
    pub fn new(window: SurfaceWindow, geometry: GeometryRect) -> Self {
        Self {
            window,
            geometry: RwLock::new(geometry),
            listeners: Arc::new(Mutex::new(ListenerSet::default())),
        }
    }

    pub fn window(&self) -> SurfaceWindow {
        self.window
    }

    /// Record a new geometry and notify subscribers.
    pub fn resize(&self, geometry: GeometryRect) {
        *self.geometry.write() = geometry;
        self.notify(geometry);
    }

    /// Notify subscribers that the surface was redrawn.
    pub fn redraw(&self) {
        let geometry = *self.geometry.read();
        self.notify(geometry);
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.lock().listeners.len()
    }

    fn notify(&self, geometry: GeometryRect) {
        // Call listeners outside the lock; they may unsubscribe.
        let listeners: Vec<RedrawListener> =
            self.listeners.lock().listeners.values().cloned().collect();
        for listener in listeners {
            listener(geometry);
        }
    }
}

impl DisplaySurface for SurfaceDescriptor {
    fn window_handle(&self) -> Result<RawWindowHandle, SurfaceError> {
        self.window.to_raw()
    }

    fn geometry(&self) -> GeometryRect {
        *self.geometry.read()
    }

    fn subscribe(&self, listener: RedrawListener) -> SurfaceSubscription {
        let key = {
            let mut set = self.listeners.lock();
            let key = set.next_key;
            set.next_key += 1;
            set.listeners.insert(key, listener);
            key
        };
        debug!("Surface subscriber {} added", key);

        let listeners: Weak<Mutex<ListenerSet>> = Arc::downgrade(&self.listeners);
        SurfaceSubscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.lock().listeners.remove(&key);
                debug!("Surface subscriber {} removed", key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_x11_resolver() {
        let surface = SurfaceDescriptor::new(SurfaceWindow::Xlib(0x1234), GeometryRect::default());
        let handle = X11Resolver.resolve(&surface).unwrap();
        assert_eq!(handle.as_raw(), 0x1234);

        let surface = SurfaceDescriptor::new(SurfaceWindow::Xcb(77), GeometryRect::default());
        assert_eq!(X11Resolver.resolve(&surface).unwrap().as_raw(), 77);
    }

    #[test]
    fn test_resolver_backend_mismatch() {
        let surface = SurfaceDescriptor::new(SurfaceWindow::Win32(0x42), GeometryRect::default());
        assert_eq!(Win32Resolver.resolve(&surface).unwrap().as_raw(), 0x42);

        let err = X11Resolver.resolve(&surface).unwrap_err();
        assert_eq!(
            err,
            SurfaceError::BackendMismatch {
                backend: WindowingBackend::X11,
                found: "Win32"
            }
        );
        assert!(QuartzResolver.resolve(&surface).is_err());
    }

    #[test]
    fn test_null_window_is_rejected() {
        let surface = SurfaceDescriptor::new(SurfaceWindow::AppKit(0), GeometryRect::default());
        assert_eq!(
            QuartzResolver.resolve(&surface).unwrap_err(),
            SurfaceError::NoNativeWindow
        );
    }

    #[test]
    fn test_auto_backend_is_concrete() {
        let backend = WindowingBackend::Auto.concrete();
        assert_ne!(backend, WindowingBackend::Auto);
        assert_eq!(WindowingBackend::Auto.resolver().backend(), backend);
        assert_eq!("Quartz".parse::<WindowingBackend>(), Ok(WindowingBackend::Quartz));
    }

    #[test]
    fn test_descriptor_notifies_until_unsubscribed() {
        let surface = SurfaceDescriptor::new(
            SurfaceWindow::Xlib(1),
            GeometryRect::new(0, 0, 320, 240),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let subscription = surface.subscribe(Arc::new(move |rect| {
            assert_eq!(rect, GeometryRect::new(0, 0, 640, 480));
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(surface.subscriber_count(), 1);

        surface.resize(GeometryRect::new(0, 0, 640, 480));
        surface.redraw();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        drop(subscription);
        assert_eq!(surface.subscriber_count(), 0);
        surface.redraw();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
