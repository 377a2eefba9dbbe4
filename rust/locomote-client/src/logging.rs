//! Log output.
//!
//! Library code only emits [`tracing`] events under
//! [`LOG_TARGET`](locomote_common::LOG_TARGET). [`init`] installs a
//! subscriber that prints them: to stderr on native targets (filtered by
//! `RUST_LOG`), and to the browser console on the web, where each event is
//! routed to the console method matching its level.

/// Install the default subscriber. Calling this more than once, or after
/// another subscriber was installed, has no effect.
#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
pub fn init() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Install the default subscriber. Calling this more than once, or after
/// another subscriber was installed, has no effect.
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_writer(console::Console)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .without_time()
        .try_init();
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod console {
    use std::io;

    use tracing::{Level, Metadata};
    use tracing_subscriber::fmt::MakeWriter;
    use wasm_bindgen::JsValue;

    /// Writes each formatted event to the browser console.
    pub struct Console;

    /// Buffers one formatted event and hands it to the console when dropped.
    pub struct ConsoleLine {
        level: Level,
        buffer: Vec<u8>,
    }

    impl io::Write for ConsoleLine {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.buffer.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleLine {
        fn drop(&mut self) {
            let line = String::from_utf8_lossy(&self.buffer);
            let line = JsValue::from_str(line.trim_end());

            if self.level == Level::ERROR {
                web_sys::console::error_1(&line);
            } else if self.level == Level::WARN {
                web_sys::console::warn_1(&line);
            } else if self.level == Level::INFO {
                web_sys::console::info_1(&line);
            } else {
                web_sys::console::debug_1(&line);
            }
        }
    }

    impl<'a> MakeWriter<'a> for Console {
        type Writer = ConsoleLine;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleLine {
                level: Level::INFO,
                buffer: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
            ConsoleLine {
                level: *meta.level(),
                buffer: Vec::new(),
            }
        }
    }
}
