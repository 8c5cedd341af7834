use std::io::Write as _;
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use crate::assets::probe::DiskProbe;
use crate::assets::resolver::{self, PrintAsset};
use crate::assets::slot::AssetSlot;
use crate::assets::storage::BookLocation;
use crate::foundation::error::{BookError, BookResult};
use crate::foundation::fs;
use crate::manifest::model::Manifest;
use crate::render::composite;
use crate::render::overlay::decode_oriented;
use crate::render::sink::{PageSink, RasterPage};

/// Print slots in document order with the image chosen for each. Unresolvable slots are
/// left out.
pub fn plan_pages(
    location: &BookLocation,
    manifest: &Manifest,
    probe: &impl DiskProbe,
) -> Vec<(AssetSlot, PrintAsset)> {
    let slots = std::iter::once(AssetSlot::Cover)
        .chain(manifest.page_numbers().into_iter().map(AssetSlot::Page));

    let mut out = Vec::new();
    for slot in slots {
        match resolver::resolve_for_print(location, manifest, slot, probe) {
            Some(asset) => {
                tracing::debug!(%slot, source = ?asset.source, path = %asset.path.display(), "print image");
                out.push((slot, asset));
            }
            None => tracing::warn!(book = %manifest.id, %slot, "no printable image, skipping"),
        }
    }
    out
}

/// Decode each planned image and stream it into `sink`, one page at a time.
///
/// Pages whose image cannot be decoded are skipped. Returns the number of pages pushed; with
/// zero pages the sink is never finished and `NotFound` is returned.
pub fn assemble_into(
    location: &BookLocation,
    manifest: &Manifest,
    probe: &impl DiskProbe,
    sink: &mut dyn PageSink,
) -> BookResult<usize> {
    let plan = plan_pages(location, manifest, probe);
    sink.begin()?;

    let mut pushed = 0usize;
    for (slot, asset) in plan {
        let page = match raster_page(slot, &asset.path) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(book = %manifest.id, %slot, error = %e, "undecodable print image, skipping");
                continue;
            }
        };
        sink.push_page(page)?;
        pushed += 1;
    }

    if pushed == 0 {
        return Err(BookError::not_found(format!(
            "book '{}' has no printable images (expected cover.png or page_NN.png)",
            manifest.id
        )));
    }
    sink.end()?;
    Ok(pushed)
}

/// Rebuild the book's document at `<dir>/book-<id>.pdf`.
#[tracing::instrument(skip(location, manifest, probe), fields(book = %manifest.id))]
pub fn build(
    location: &BookLocation,
    manifest: &Manifest,
    probe: &impl DiskProbe,
) -> BookResult<PathBuf> {
    let out = location.pdf_output_path(&manifest.id);
    let mut sink = PdfSink::new(&out);
    let pages = assemble_into(location, manifest, probe, &mut sink)?;
    tracing::info!(pages, path = %out.display(), "document rebuilt");
    Ok(out)
}

fn raster_page(slot: AssetSlot, path: &Path) -> BookResult<RasterPage> {
    let rgba = decode_oriented(path)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb8 = Vec::with_capacity((width as usize) * (height as usize) * 3);
    for px in rgba.pixels() {
        rgb8.extend_from_slice(&composite::flatten_on_white(px.0));
    }
    Ok(RasterPage {
        slot,
        width,
        height,
        rgb8,
    })
}

/// Writes pages into a PDF where every page is exactly its image's pixel size (1 px = 1 pt).
///
/// Each page's pixels are Flate-compressed on push and dropped; only compressed streams are
/// kept until `end`, which writes to a temporary file and renames it over the target.
pub struct PdfSink {
    out_path: PathBuf,
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl PdfSink {
    /// Sink that will publish to `out_path` on `end`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            out_path: out_path.into(),
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }
}

impl PageSink for PdfSink {
    fn begin(&mut self) -> BookResult<()> {
        self.kids.clear();
        Ok(())
    }

    fn push_page(&mut self, page: RasterPage) -> BookResult<()> {
        let RasterPage {
            width,
            height,
            rgb8,
            ..
        } = page;

        let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(&rgb8)
            .map_err(|e| BookError::io(&self.out_path, e))?;
        drop(rgb8);
        let compressed = enc.finish().map_err(|e| BookError::io(&self.out_path, e))?;

        let w = i64::from(width);
        let h = i64::from(height);
        let mut image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => w,
                "Height" => h,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed,
        );
        image.allows_compression = false;
        let image_id = self.doc.add_object(image);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Integer(w),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(h),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content
            .encode()
            .map_err(|e| BookError::Other(anyhow::anyhow!("encode page content: {e}")))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content_bytes));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(w),
                Object::Integer(h),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        self.kids.push(Object::Reference(page_id));
        Ok(())
    }

    fn end(&mut self) -> BookResult<()> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => std::mem::take(&mut self.kids),
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let doc = &mut self.doc;
        fs::write_atomic_with(&self.out_path, |file| {
            let mut w = std::io::BufWriter::new(file);
            doc.save_to(&mut w)
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            w.flush()
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pdf.rs"]
mod tests;
