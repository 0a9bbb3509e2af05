//! Multistatus responses for PROPFIND

use crate::{path::DavPath, resolver::ResolvedEntity};
use chrono::{DateTime, Utc};
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use thiserror::Error;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Failure while writing a multistatus document
#[derive(Error, Debug)]
#[error("XML write failed: {0}")]
pub struct XmlError(pub String);

/// Properties of one `D:response`
#[derive(Clone, Debug, PartialEq)]
pub struct PropEntry {
    /// Percent-encoded href
    pub href: String,
    pub display_name: String,
    pub collection: bool,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl PropEntry {
    /// Describe an entity found at `path`
    pub fn from_entity(path: &DavPath, entity: &ResolvedEntity) -> Self {
        let collection = entity.is_folder();
        let content_type = (!collection).then(|| {
            mime_guess::from_path(&entity.name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

        Self {
            href: path.href(collection),
            display_name: entity.name.clone(),
            collection,
            content_length: entity.size_bytes,
            content_type,
            created_at: entity.created_at,
            last_modified: entity.updated_at.or(entity.created_at),
        }
    }
}

fn xml_err(e: impl std::fmt::Display) -> XmlError {
    XmlError(e.to_string())
}

fn write_text(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), XmlError> {
    writer.write_event(Event::Start(BytesStart::new(name))).map_err(xml_err)?;
    writer.write_event(Event::Text(BytesText::new(text))).map_err(xml_err)?;
    writer.write_event(Event::End(BytesEnd::new(name))).map_err(xml_err)?;
    Ok(())
}

fn start(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), XmlError> {
    writer.write_event(Event::Start(BytesStart::new(name))).map_err(xml_err)
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), XmlError> {
    writer.write_event(Event::End(BytesEnd::new(name))).map_err(xml_err)
}

fn write_response(writer: &mut Writer<Vec<u8>>, entry: &PropEntry) -> Result<(), XmlError> {
    start(writer, "D:response")?;
    write_text(writer, "D:href", &entry.href)?;
    start(writer, "D:propstat")?;
    start(writer, "D:prop")?;

    write_text(writer, "D:displayname", &entry.display_name)?;
    if entry.collection {
        start(writer, "D:resourcetype")?;
        writer
            .write_event(Event::Empty(BytesStart::new("D:collection")))
            .map_err(xml_err)?;
        end(writer, "D:resourcetype")?;
    } else {
        writer
            .write_event(Event::Empty(BytesStart::new("D:resourcetype")))
            .map_err(xml_err)?;
    }
    if let Some(length) = entry.content_length {
        write_text(writer, "D:getcontentlength", &length.to_string())?;
    }
    if let Some(content_type) = &entry.content_type {
        write_text(writer, "D:getcontenttype", content_type)?;
    }
    if let Some(created) = entry.created_at {
        write_text(writer, "D:creationdate", &created.to_rfc3339())?;
    }
    if let Some(modified) = entry.last_modified {
        write_text(writer, "D:getlastmodified", &modified.format(HTTP_DATE).to_string())?;
    }

    end(writer, "D:prop")?;
    write_text(writer, "D:status", "HTTP/1.1 200 OK")?;
    end(writer, "D:propstat")?;
    end(writer, "D:response")
}

/// Build a `DAV:` multistatus document with one response per entry
pub fn multistatus(entries: &[PropEntry]) -> Result<String, XmlError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml_err)?;

    let mut root = BytesStart::new("D:multistatus");
    root.push_attribute(("xmlns:D", "DAV:"));
    writer.write_event(Event::Start(root)).map_err(xml_err)?;

    for entry in entries {
        write_response(&mut writer, entry)?;
    }

    end(&mut writer, "D:multistatus")?;
    String::from_utf8(writer.into_inner()).map_err(xml_err)
}
