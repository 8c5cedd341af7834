use crate::assets::slot::AssetSlot;
use crate::foundation::error::BookResult;

/// One print page: opaque RGB8 pixels at the source image's exact size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterPage {
    /// Cover or page number this image prints.
    pub slot: AssetSlot,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGB8, tightly packed.
    pub rgb8: Vec<u8>,
}

/// Sink contract for consuming print pages in document order.
///
/// Ordering contract: the cover (if any) first, then pages by ascending number. Sinks take
/// ownership of each page so its pixels can be dropped as soon as they are encoded.
pub trait PageSink {
    /// Called once before any pages are pushed.
    fn begin(&mut self) -> BookResult<()>;
    /// Push one page in document order.
    fn push_page(&mut self, page: RasterPage) -> BookResult<()>;
    /// Called once after the last page is pushed.
    fn end(&mut self) -> BookResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    began: bool,
    ended: bool,
    pages: Vec<RasterPage>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the captured pages.
    pub fn pages(&self) -> &[RasterPage] {
        &self.pages
    }

    /// Whether `begin` and `end` were both called.
    pub fn is_complete(&self) -> bool {
        self.began && self.ended
    }
}

impl PageSink for InMemorySink {
    fn begin(&mut self) -> BookResult<()> {
        self.began = true;
        self.pages.clear();
        Ok(())
    }

    fn push_page(&mut self, page: RasterPage) -> BookResult<()> {
        self.pages.push(page);
        Ok(())
    }

    fn end(&mut self) -> BookResult<()> {
        self.ended = true;
        Ok(())
    }
}
