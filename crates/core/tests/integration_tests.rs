//! Integration tests for fileconv-core.
//!
//! Fixtures are generated into a temp directory per test, so no external
//! tools or checked-in files are needed.
//!
//! Run with: cargo test --package fileconv-core --test integration_tests

use fileconv_core::{
    config::{ConversionOptions, ConversionRequest},
    converter::{CancellationToken, Converter, ConverterBuilder},
    error::{ConversionError, ErrorKind},
    format::Format,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_fixture(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn png_fixture(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 200])
    });
    let path = dir.join(name);
    image.save_with_format(&path, ImageFormat::Png).unwrap();
    path
}

fn docx_fixture(dir: &Path, name: &str) -> PathBuf {
    use docx_rs::{Docx, Paragraph, Run};

    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    Docx::new()
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text("Quarterly Report"))
                .style("Heading1"),
        )
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text("Revenue "))
                .add_run(Run::new().add_text("grew").bold()),
        )
        .build()
        .pack(file)
        .unwrap();
    path
}

fn xlsx_fixture(dir: &Path, name: &str) -> PathBuf {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "item").unwrap();
    sheet.write_string(0, 1, "note").unwrap();
    sheet.write_string(1, 0, "bolts").unwrap();
    sheet.write_string(1, 1, "small, steel").unwrap();
    sheet.write_string(2, 0, "nuts").unwrap();
    sheet.write_string(2, 1, "<hex>").unwrap();
    let path = dir.join(name);
    workbook.save(&path).unwrap();
    path
}

fn pdf_page_count(path: &Path) -> usize {
    lopdf::Document::load(path).unwrap().get_pages().len()
}

fn visible_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ============================================================================
// Document Conversion Tests
// ============================================================================

#[test]
fn test_text_to_html_escapes_into_pre() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_fixture(temp_dir.path(), "note.txt", "hello\nworld <b>");

    let output = Converter::default()
        .convert(&ConversionRequest::new(&source, "html"))
        .unwrap();

    assert_eq!(output, temp_dir.path().join("note.html"));
    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("<h1>Converted Text Document</h1>"));
    assert!(html.contains("<pre>hello\nworld &lt;b&gt;</pre>"));
    assert!(html.contains("<title>Converted Document</title>"));
}

#[test]
fn test_html_to_text_strips_and_decodes() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_fixture(
        temp_dir.path(),
        "page.html",
        "<html><head><style>p { color: red; }</style></head>\
         <body><p>Hi &amp; Bye</p><script>alert(1)</script></body></html>",
    );

    let output = Converter::default()
        .convert(&ConversionRequest::new(&source, "txt"))
        .unwrap();

    assert_eq!(std::fs::read_to_string(output).unwrap(), "Hi & Bye");
}

#[test]
fn test_text_to_pdf_paginates() {
    let temp_dir = TempDir::new().unwrap();
    let text: String = (0..200).map(|i| format!("line {}\n", i)).collect();
    let source = write_fixture(temp_dir.path(), "long.txt", text);

    let output = Converter::default()
        .convert(&ConversionRequest::new(&source, "pdf"))
        .unwrap();

    // A4 page, 50pt margins, 14.4pt lines: 51 lines per page, 201 lines.
    assert_eq!(pdf_page_count(&output), 4);
}

#[test]
fn test_empty_text_to_pdf_has_one_page() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_fixture(temp_dir.path(), "empty.txt", "");

    let output = Converter::default()
        .convert(&ConversionRequest::new(&source, "pdf"))
        .unwrap();

    assert_eq!(pdf_page_count(&output), 1);
}

#[test]
fn test_docx_conversions() {
    let temp_dir = TempDir::new().unwrap();
    let source = docx_fixture(temp_dir.path(), "report.docx");
    let converter = Converter::default();

    let txt = converter
        .convert(&ConversionRequest::new(&source, "txt"))
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(txt).unwrap(),
        "Quarterly Report\n\nRevenue grew\n\n"
    );

    let html = converter
        .convert(&ConversionRequest::new(&source, "html"))
        .unwrap();
    let html = std::fs::read_to_string(html).unwrap();
    assert!(html.contains("<h1>Quarterly Report</h1>"));
    assert!(html.contains("<p>Revenue <strong>grew</strong></p>"));

    let pdf = converter
        .convert(&ConversionRequest::new(&source, "pdf"))
        .unwrap();
    assert_eq!(pdf_page_count(&pdf), 1);
}

#[test]
fn test_listed_but_unimplemented_conversions() {
    let temp_dir = TempDir::new().unwrap();
    let converter = Converter::default();
    let cases = [
        (write_fixture(temp_dir.path(), "a.txt", "text"), "docx"),
        (write_fixture(temp_dir.path(), "b.html", "<p>x</p>"), "pdf"),
        (write_fixture(temp_dir.path(), "c.pdf", "%PDF-1.4"), "txt"),
        (temp_dir.path().join("c.pdf"), "html"),
    ];

    for (source, target) in cases {
        let err = converter
            .convert(&ConversionRequest::new(&source, target))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnimplementedFeature, "{:?}", source);
        assert!(matches!(err, ConversionError::Failed(_)));
        assert!(err.to_string().starts_with("Conversion failed: "));
    }

    assert_eq!(
        visible_entries(temp_dir.path()),
        vec!["a.txt", "b.html", "c.pdf"]
    );
}

// ============================================================================
// Spreadsheet Conversion Tests
// ============================================================================

#[test]
fn test_csv_to_html_header_and_rows() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_fixture(temp_dir.path(), "data.csv", "a,b\n1,2\n3,4");

    let output = Converter::default()
        .convert(&ConversionRequest::new(&source, "html"))
        .unwrap();
    let html = std::fs::read_to_string(output).unwrap();

    assert!(html.contains("<h1>Converted CSV Data</h1>"));
    assert_eq!(html.matches("<tr><th>").count(), 1);
    assert_eq!(html.matches("<tr><td>").count(), 2);
    assert!(html.contains("<tr><th>a</th><th>b</th></tr>"));
    assert!(html.contains("<tr><td>3</td><td>4</td></tr>"));
}

#[test]
fn test_csv_to_html_keeps_row_of_empty_cells() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_fixture(temp_dir.path(), "gaps.csv", "a,b\n,\n\n1,2\n");

    let output = Converter::default()
        .convert(&ConversionRequest::new(&source, "html"))
        .unwrap();
    let html = std::fs::read_to_string(output).unwrap();

    assert!(html.contains("<tr><td></td><td></td></tr>"));
    assert_eq!(html.matches("<tr><td>").count(), 2);
}

#[test]
fn test_csv_xlsx_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_fixture(temp_dir.path(), "stock.csv", "name,qty\nbolts,12\nnuts,7\n");
    let back_dir = temp_dir.path().join("back");
    let converter = Converter::default();

    let xlsx = converter
        .convert(&ConversionRequest::new(&source, "xlsx"))
        .unwrap();
    assert_eq!(xlsx, temp_dir.path().join("stock.xlsx"));

    let csv = converter
        .convert(&ConversionRequest::new(&xlsx, "csv").with_output_dir(&back_dir))
        .unwrap();
    assert_eq!(csv, back_dir.join("stock.csv"));
    assert_eq!(
        std::fs::read_to_string(csv).unwrap(),
        "name,qty\nbolts,12\nnuts,7\n"
    );
}

#[test]
fn test_csv_xlsx_round_trip_keeps_leading_blanks() {
    let temp_dir = TempDir::new().unwrap();
    let converter = Converter::default();
    let cases = [
        ("column.csv", ",b\n,d\n"),
        ("row.csv", ",,\n,a,b\n"),
    ];

    for (name, contents) in cases {
        let source = write_fixture(temp_dir.path(), name, contents);
        let xlsx = converter
            .convert(&ConversionRequest::new(&source, "xlsx"))
            .unwrap();
        let csv = converter
            .convert(&ConversionRequest::new(&xlsx, "csv").with_output_dir(temp_dir.path().join("back")))
            .unwrap();
        assert_eq!(std::fs::read_to_string(csv).unwrap(), contents, "{}", name);
    }
}

#[test]
fn test_xlsx_conversions() {
    let temp_dir = TempDir::new().unwrap();
    let source = xlsx_fixture(temp_dir.path(), "parts.xlsx");
    let converter = Converter::default();

    let csv = converter
        .convert(&ConversionRequest::new(&source, "csv"))
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(csv).unwrap(),
        "item,note\nbolts,\"small, steel\"\nnuts,<hex>\n"
    );

    let html = converter
        .convert(&ConversionRequest::new(&source, "html"))
        .unwrap();
    let html = std::fs::read_to_string(html).unwrap();
    assert!(html.contains("<title>Converted Spreadsheet</title>"));
    assert!(html.contains("<td>nuts</td><td>&lt;hex&gt;</td>"));

    let pdf = converter
        .convert(&ConversionRequest::new(&source, "pdf"))
        .unwrap();
    assert_eq!(pdf_page_count(&pdf), 1);
}

#[test]
fn test_csv_to_pdf_uses_table_layout() {
    let temp_dir = TempDir::new().unwrap();
    let csv: String = (0..130).map(|i| format!("{},{}\n", i, i * 2)).collect();
    let source = write_fixture(temp_dir.path(), "rows.csv", csv);

    let output = Converter::default()
        .convert(&ConversionRequest::new(&source, "pdf"))
        .unwrap();

    // 10pt font: 12pt lines, 61 rows per page.
    assert_eq!(pdf_page_count(&output), 3);
}

// ============================================================================
// Image Conversion Tests
// ============================================================================

#[test]
fn test_png_to_jpg_with_resize() {
    let temp_dir = TempDir::new().unwrap();
    let source = png_fixture(temp_dir.path(), "photo.png", 200, 100);
    let options = ConversionOptions::with_quality(70).width(50);

    let output = Converter::default()
        .convert(&ConversionRequest::new(&source, "JPG").with_options(options))
        .unwrap();

    assert_eq!(output, temp_dir.path().join("photo.jpg"));
    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (50, 25));
}

#[test]
fn test_image_never_upscaled() {
    let temp_dir = TempDir::new().unwrap();
    let source = png_fixture(temp_dir.path(), "small.png", 20, 10);
    let options = ConversionOptions::default().width(400).height(400);

    let output = Converter::default()
        .convert(&ConversionRequest::new(&source, "bmp").with_options(options))
        .unwrap();

    let decoded = image::open(output).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (20, 10));
}

#[test]
fn test_png_to_pdf_page_matches_image() {
    let temp_dir = TempDir::new().unwrap();
    let image = RgbaImage::from_pixel(40, 30, Rgba([10, 20, 30, 128]));
    let source = temp_dir.path().join("badge.png");
    DynamicImage::ImageRgba8(image)
        .save_with_format(&source, ImageFormat::Png)
        .unwrap();

    let output = Converter::default()
        .convert(&ConversionRequest::new(&source, "pdf"))
        .unwrap();

    let doc = lopdf::Document::load(&output).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1);
    let page_id = *pages.values().next().unwrap();
    let media_box = doc
        .get_dictionary(page_id)
        .unwrap()
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap();
    assert_eq!(media_box[2].as_float().unwrap(), 40.0);
    assert_eq!(media_box[3].as_float().unwrap(), 30.0);
}

#[test]
fn test_corrupt_image_reports_encoding_error() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_fixture(temp_dir.path(), "broken.png", b"not an image at all");

    let err = Converter::default()
        .convert(&ConversionRequest::new(&source, "webp"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Encoding);
    assert!(!temp_dir.path().join("broken.webp").exists());
}

// ============================================================================
// Dispatch Tests
// ============================================================================

#[test]
fn test_every_listed_pair_is_dispatched() {
    let temp_dir = TempDir::new().unwrap();
    let converter = Converter::default();

    for &source in Format::all() {
        let path = temp_dir.path().join(format!("missing.{}", source.extension()));
        for &target in source.targets() {
            let request = ConversionRequest::new(&path, target.extension())
                .with_output_dir(temp_dir.path().join("out"));
            let err = converter.convert(&request).unwrap_err();
            assert_ne!(
                err.kind(),
                ErrorKind::UnsupportedConversion,
                "{} -> {}",
                source,
                target
            );
            assert_ne!(err.kind(), ErrorKind::UnsupportedCategory);
        }
    }
}

#[test]
fn test_unlisted_pairs_are_rejected_before_reading() {
    let converter = Converter::default();
    let cases = [
        ("report.pdf", "docx"),
        ("photo.png", "png"),
        ("data.csv", "txt"),
        ("notes.txt", "xlsx"),
        ("song.mp3", "wav"),
        ("noext", "pdf"),
    ];

    for (source, target) in cases {
        let err = converter
            .convert(&ConversionRequest::new(source, target))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedConversion, "{}", source);
        assert!(!matches!(err, ConversionError::Failed(_)));
    }
}

#[test]
fn test_missing_source_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = Converter::default()
        .convert(&ConversionRequest::new(temp_dir.path().join("gone.csv"), "html"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("gone.csv"));
}

#[test]
fn test_output_dir_is_created() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_fixture(temp_dir.path(), "a.txt", "x");
    let out_dir = temp_dir.path().join("nested/out");

    let output = Converter::default()
        .convert(&ConversionRequest::new(&source, ".HTML").with_output_dir(&out_dir))
        .unwrap();

    assert_eq!(output, out_dir.join("a.html"));
    assert!(output.exists());
}

#[test]
fn test_custom_layout_changes_pagination() {
    let temp_dir = TempDir::new().unwrap();
    let text: String = (0..60).map(|i| format!("{}\n", i)).collect();
    let source = write_fixture(temp_dir.path(), "lines.txt", text);

    let converter = ConverterBuilder::new().text_font_size(20.0).build().unwrap();
    let output = converter
        .convert(&ConversionRequest::new(&source, "pdf"))
        .unwrap();

    // 24pt lines: 30 lines per page, 61 lines.
    assert_eq!(pdf_page_count(&output), 3);
}

// ============================================================================
// Batch Tests
// ============================================================================

#[test]
fn test_batch_continues_after_failure() {
    let temp_dir = TempDir::new().unwrap();
    let good = write_fixture(temp_dir.path(), "good.txt", "fine");
    let requests = vec![
        ConversionRequest::new(temp_dir.path().join("report.pdf"), "docx"),
        ConversionRequest::new(&good, "html"),
    ];

    let mut progress = Vec::new();
    let batch = Converter::default().convert_batch_with_progress(
        &requests,
        &CancellationToken::new(),
        |p| progress.push((p.completed, p.total, p.current_file, p.success)),
    );

    assert_eq!(batch.results.len(), 2);
    assert!(!batch.results[0].success);
    assert_eq!(
        batch.results[0].error_kind,
        Some(ErrorKind::UnsupportedConversion)
    );
    assert!(batch.results[1].success);
    assert_eq!(batch.summary(), "1 of 2 files converted successfully");
    assert_eq!(
        progress,
        vec![
            (1, 2, "report.pdf".to_string(), false),
            (2, 2, "good.txt".to_string(), true),
        ]
    );
}

#[test]
fn test_batch_cancellation_between_files() {
    let temp_dir = TempDir::new().unwrap();
    let requests: Vec<_> = (0..4)
        .map(|i| {
            let path = write_fixture(temp_dir.path(), &format!("f{}.txt", i), "x");
            ConversionRequest::new(path, "html")
        })
        .collect();

    let cancel = CancellationToken::new();
    let batch = Converter::default().convert_batch_with_progress(&requests, &cancel, |p| {
        if p.completed == 2 {
            cancel.cancel();
        }
    });

    assert!(batch.cancelled);
    assert_eq!(batch.results.len(), 2);
    assert_eq!(batch.total_files, 4);
    assert!(temp_dir.path().join("f1.html").exists());
    assert!(!temp_dir.path().join("f2.html").exists());
    assert!(batch.summary().ends_with("(cancelled)"));
}

#[test]
fn test_batch_results_serialize_camel_case() {
    let temp_dir = TempDir::new().unwrap();
    let good = write_fixture(temp_dir.path(), "ok.csv", "a\n1");
    let batch = Converter::default().convert_batch(&[
        ConversionRequest::new(&good, "html"),
        ConversionRequest::new("bad.pdf", "xlsx"),
    ]);

    let json = serde_json::to_value(&batch).unwrap();
    assert_eq!(json["totalFiles"], 2);
    assert_eq!(json["results"][0]["success"], true);
    assert!(json["results"][0]["outputPath"].is_string());
    assert_eq!(json["results"][1]["errorKind"], "UnsupportedConversion");
    assert!(json["results"][1].get("outputPath").is_none());
}
