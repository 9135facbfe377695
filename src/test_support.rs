// Shared fixtures for unit tests

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};

use crate::pipeline::{Document, TextSource};

pub const RDL_LETTER: &str = "DEPARTMENT OF VETERANS AFFAIRS
Veterans Benefits Administration
Regional Office
ARIANA ATKINS
VA File Number
209 684 1394
Rating Decision
08/05/2025
INTRODUCTION
The records reflect that you are a Veteran of the Peacetime.";

pub const RCS_FORM: &str = "TM CLIENT AUTHORIZATION FORM
Document ID: TM-RCS-2023-8765
Client: John A. Smith (ID: TM-1142-2023)
Date Issued: 15-Aug-2023

Authorization Request
I, John A. Smith (TM Client ID: TM-1142-2023), hereby authorize:";

/// Treats file contents as already-extracted text. PDFs can be marked as
/// encrypted with [`FixtureTextSource::lock`].
#[derive(Default)]
pub struct FixtureTextSource {
    locked: Mutex<HashSet<PathBuf>>,
    extracted: Mutex<Vec<PathBuf>>,
}

impl FixtureTextSource {
    pub fn lock(&self, path: &Path) {
        self.locked.lock().unwrap().insert(path.to_path_buf());
    }

    /// Paths `extract` was called for, in call order.
    pub fn extracted(&self) -> Vec<PathBuf> {
        self.extracted.lock().unwrap().clone()
    }
}

impl TextSource for FixtureTextSource {
    fn is_protected(&self, document: &Document) -> bool {
        self.locked.lock().unwrap().contains(document.path())
    }

    fn extract(&self, document: &Document) -> String {
        self.extracted.lock().unwrap().push(document.path().to_path_buf());
        fs::read(document.path())
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

pub fn write_fixture(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

/// Single-page PDF showing `text` on one line.
pub fn write_text_pdf(path: &Path, text: &str) {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 48.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// Text PDF whose trailer references a standard security handler
/// dictionary. The page content itself stays in the clear.
pub fn write_encrypted_pdf(path: &Path) {
    write_text_pdf(path, "Hello World!");
    let mut doc = lopdf::Document::load(path).unwrap();
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "O" => Object::string_literal(vec![0u8; 32]),
        "U" => Object::string_literal(vec![0u8; 32]),
        "P" => -44,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.save(path).unwrap();
}
