//! Template patching: write extracted values into a copy of the Bespoke
//! Model workbook without disturbing anything else in it.
//!
//! The template is an OPC zip. Only the target worksheet's XML is rewritten,
//! event by event; every other entry (styles, shared strings, other sheets,
//! `vbaProject.bin`) is copied byte-for-byte, so formulas and macros survive
//! without being interpreted.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use zip::{write::FileOptions, ZipArchive, ZipWriter};

use crate::error::{ModelError, ModelResult};
use crate::types::{CellPatch, CellRef, CellValue};

/// Copy the template to `output_path` with `patches` applied to the sheet
/// named `sheet_name`.
pub fn fill_template(
    template_path: &Path,
    output_path: &Path,
    sheet_name: &str,
    patches: &[CellPatch],
) -> ModelResult<()> {
    if !template_path.exists() {
        return Err(ModelError::Template(format!(
            "Template file not found at {}",
            template_path.display()
        )));
    }

    let file = File::open(template_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| ModelError::Template(format!("Failed to open template archive: {}", e)))?;

    let workbook_xml = read_entry(&mut archive, "xl/workbook.xml")?;
    let rels_xml = read_entry(&mut archive, "xl/_rels/workbook.xml.rels")?;
    let sheet_part = locate_sheet_part(&workbook_xml, &rels_xml, sheet_name)?;

    let result = write_output(&mut archive, output_path, &sheet_part, patches);
    if result.is_err() {
        let _ = std::fs::remove_file(output_path);
    }
    result
}

/// Stream every archive entry into the output, patching only the target
/// worksheet part. The caller removes the output on failure so a half
/// written workbook never survives.
fn write_output(
    archive: &mut ZipArchive<BufReader<File>>,
    output_path: &Path,
    sheet_part: &str,
    patches: &[CellPatch],
) -> ModelResult<()> {
    let output_file = File::create(output_path)?;
    let mut zip_writer = ZipWriter::new(output_file);

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| ModelError::Template(format!("Failed to read template entry: {}", e)))?;
        let name = entry.name().to_string();

        zip_writer
            .start_file(&name, FileOptions::<()>::default())
            .map_err(|e| ModelError::Template(format!("Failed to write '{}': {}", name, e)))?;

        if name == sheet_part {
            let mut xml = String::new();
            entry.read_to_string(&mut xml)?;
            let patched = patch_sheet_xml(&xml, patches)?;
            std::io::Write::write_all(&mut zip_writer, patched.as_bytes())?;
        } else {
            let mut buffer = Vec::new();
            entry.read_to_end(&mut buffer)?;
            std::io::Write::write_all(&mut zip_writer, &buffer)?;
        }
    }

    zip_writer
        .finish()
        .map_err(|e| ModelError::Template(format!("Failed to finish output archive: {}", e)))?;
    Ok(())
}

fn read_entry(archive: &mut ZipArchive<BufReader<File>>, name: &str) -> ModelResult<String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| ModelError::Template(format!("Template is missing '{}': {}", name, e)))?;
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(content)
}

/// Resolve a sheet name to its worksheet part path inside the archive, going
/// through workbook.xml (name → relationship id) and the workbook rels
/// (relationship id → target).
fn locate_sheet_part(
    workbook_xml: &str,
    rels_xml: &str,
    sheet_name: &str,
) -> ModelResult<String> {
    let mut reader = Reader::from_str(workbook_xml);
    let mut rel_id: Option<String> = None;
    let mut available = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                let mut name = String::new();
                let mut rid = String::new();
                for attr in e.attributes() {
                    let attr =
                        attr.map_err(|e| ModelError::Template(format!("Bad workbook XML: {}", e)))?;
                    let value = attr
                        .unescape_value()
                        .map_err(|e| ModelError::Template(format!("Bad workbook XML: {}", e)))?;
                    match attr.key.as_ref() {
                        b"name" => name = value.into_owned(),
                        b"r:id" => rid = value.into_owned(),
                        _ => {}
                    }
                }
                if name == sheet_name {
                    rel_id = Some(rid);
                }
                available.push(name);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ModelError::Template(format!(
                    "Failed to parse workbook XML: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    let rel_id = rel_id.ok_or_else(|| {
        ModelError::Template(format!(
            "Template must contain a '{}' worksheet (found: {})",
            sheet_name,
            available.join(", ")
        ))
    })?;

    let mut reader = Reader::from_str(rels_xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = String::new();
                let mut target = String::new();
                for attr in e.attributes() {
                    let attr =
                        attr.map_err(|e| ModelError::Template(format!("Bad rels XML: {}", e)))?;
                    let value = attr
                        .unescape_value()
                        .map_err(|e| ModelError::Template(format!("Bad rels XML: {}", e)))?;
                    match attr.key.as_ref() {
                        b"Id" => id = value.into_owned(),
                        b"Target" => target = value.into_owned(),
                        _ => {}
                    }
                }
                if id == rel_id {
                    let part = if let Some(absolute) = target.strip_prefix('/') {
                        absolute.to_string()
                    } else {
                        format!("xl/{}", target)
                    };
                    return Ok(part);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ModelError::Template(format!(
                    "Failed to parse workbook rels: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    Err(ModelError::Template(format!(
        "No relationship target for sheet '{}'",
        sheet_name
    )))
}

type RowPatches = BTreeMap<u32, CellValue>;

/// Rewrite a worksheet XML, replacing or inserting the patched cells.
///
/// Existing cells keep their style index; cells and rows that the sparse XML
/// does not contain yet are inserted in correct row/column order.
fn patch_sheet_xml(xml: &str, patches: &[CellPatch]) -> ModelResult<String> {
    let mut pending: BTreeMap<u32, RowPatches> = BTreeMap::new();
    for patch in patches {
        pending
            .entry(patch.dest.row)
            .or_default()
            .insert(patch.dest.col, patch.value.clone());
    }

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let xml_err = |e: quick_xml::Error| ModelError::Template(format!("Bad worksheet XML: {}", e));
    let io_err = |e: std::io::Error| ModelError::Template(format!("Worksheet write failed: {}", e));

    // Implicit positions for rows/cells whose r attribute is omitted.
    let mut next_row: u32 = 0;
    let mut current_row: Option<u32> = None;
    let mut next_col: u32 = 0;
    // Cells left to write into the row currently open.
    let mut row_pending: RowPatches = RowPatches::new();

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                let row_idx = row_index(&e)?.unwrap_or(next_row);
                // Whole missing rows that sort before this one go in first.
                flush_rows_before(&mut writer, &mut pending, row_idx).map_err(io_err)?;
                row_pending = pending.remove(&row_idx).unwrap_or_default();
                current_row = Some(row_idx);
                next_row = row_idx + 1;
                next_col = 0;
                writer.write_event(Event::Start(e)).map_err(io_err)?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                let row_idx = row_index(&e)?.unwrap_or(next_row);
                flush_rows_before(&mut writer, &mut pending, row_idx).map_err(io_err)?;
                next_row = row_idx + 1;
                if let Some(cells) = pending.remove(&row_idx) {
                    // Self-closing row gains children.
                    let end = e.to_end().into_owned();
                    writer.write_event(Event::Start(e)).map_err(io_err)?;
                    write_cells(&mut writer, row_idx, &cells).map_err(io_err)?;
                    writer.write_event(Event::End(end)).map_err(io_err)?;
                } else {
                    writer.write_event(Event::Empty(e)).map_err(io_err)?;
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => {
                if let Some(row_idx) = current_row.take() {
                    let cells = std::mem::take(&mut row_pending);
                    write_cells(&mut writer, row_idx, &cells).map_err(io_err)?;
                }
                writer.write_event(Event::End(e)).map_err(io_err)?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"c" && current_row.is_some() => {
                let row_idx = current_row.unwrap_or(0);
                let (col_idx, style) = cell_attrs(&e)?;
                let col_idx = col_idx.unwrap_or(next_col);
                next_col = col_idx + 1;

                flush_cells_before(&mut writer, &mut row_pending, row_idx, col_idx)
                    .map_err(io_err)?;

                if let Some(value) = row_pending.remove(&col_idx) {
                    skip_to_cell_end(&mut reader)?;
                    write_patched_cell(&mut writer, row_idx, col_idx, style.as_deref(), &value)
                        .map_err(io_err)?;
                } else {
                    writer.write_event(Event::Start(e)).map_err(io_err)?;
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" && current_row.is_some() => {
                let row_idx = current_row.unwrap_or(0);
                let (col_idx, style) = cell_attrs(&e)?;
                let col_idx = col_idx.unwrap_or(next_col);
                next_col = col_idx + 1;

                flush_cells_before(&mut writer, &mut row_pending, row_idx, col_idx)
                    .map_err(io_err)?;

                if let Some(value) = row_pending.remove(&col_idx) {
                    write_patched_cell(&mut writer, row_idx, col_idx, style.as_deref(), &value)
                        .map_err(io_err)?;
                } else {
                    writer.write_event(Event::Empty(e)).map_err(io_err)?;
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"sheetData" => {
                // Rows beyond the last existing one.
                flush_rows_before(&mut writer, &mut pending, u32::MAX).map_err(io_err)?;
                writer.write_event(Event::End(e)).map_err(io_err)?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"sheetData" => {
                // A sheet with no cells; the element gains children.
                let end = e.to_end().into_owned();
                writer.write_event(Event::Start(e)).map_err(io_err)?;
                flush_rows_before(&mut writer, &mut pending, u32::MAX).map_err(io_err)?;
                writer.write_event(Event::End(end)).map_err(io_err)?;
            }
            Event::Eof => break,
            event => writer.write_event(event).map_err(io_err)?,
        }
    }

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes)
        .map_err(|e| ModelError::Template(format!("Patched worksheet is not UTF-8: {}", e)))
}

fn row_index(e: &BytesStart) -> ModelResult<Option<u32>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| ModelError::Template(format!("Bad row attribute: {}", e)))?;
        if attr.key.as_ref() == b"r" {
            let value = attr
                .unescape_value()
                .map_err(|e| ModelError::Template(format!("Bad row attribute: {}", e)))?;
            let one_based: u32 = value
                .parse()
                .map_err(|_| ModelError::Template(format!("Bad row number '{}'", value)))?;
            return Ok(Some(one_based.saturating_sub(1)));
        }
    }
    Ok(None)
}

/// Column index and style index of a `<c>` element.
fn cell_attrs(e: &BytesStart) -> ModelResult<(Option<u32>, Option<String>)> {
    let mut col = None;
    let mut style = None;
    for attr in e.attributes() {
        let attr = attr.map_err(|e| ModelError::Template(format!("Bad cell attribute: {}", e)))?;
        let value = attr
            .unescape_value()
            .map_err(|e| ModelError::Template(format!("Bad cell attribute: {}", e)))?;
        match attr.key.as_ref() {
            b"r" => col = Some(CellRef::parse(&value)?.col),
            b"s" => style = Some(value.into_owned()),
            _ => {}
        }
    }
    Ok((col, style))
}

/// Consume reader events until the current `<c>` element closes.
fn skip_to_cell_end(reader: &mut Reader<&[u8]>) -> ModelResult<()> {
    let mut depth = 1u32;
    loop {
        match reader
            .read_event()
            .map_err(|e| ModelError::Template(format!("Bad worksheet XML: {}", e)))?
        {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(ModelError::Template(
                    "Unexpected end of worksheet XML inside a cell".to_string(),
                ))
            }
            _ => {}
        }
    }
}

fn flush_rows_before<W: std::io::Write>(
    writer: &mut Writer<W>,
    pending: &mut BTreeMap<u32, RowPatches>,
    before: u32,
) -> std::io::Result<()> {
    let rows: Vec<u32> = pending.range(..before).map(|(row, _)| *row).collect();
    for row_idx in rows {
        if let Some(cells) = pending.remove(&row_idx) {
            let mut row = BytesStart::new("row");
            row.push_attribute(("r", (row_idx + 1).to_string().as_str()));
            writer.write_event(Event::Start(row))?;
            write_cells(writer, row_idx, &cells)?;
            writer.write_event(Event::End(BytesEnd::new("row")))?;
        }
    }
    Ok(())
}

fn flush_cells_before<W: std::io::Write>(
    writer: &mut Writer<W>,
    row_pending: &mut RowPatches,
    row_idx: u32,
    before: u32,
) -> std::io::Result<()> {
    let cols: Vec<u32> = row_pending.range(..before).map(|(col, _)| *col).collect();
    for col in cols {
        if let Some(value) = row_pending.remove(&col) {
            write_patched_cell(writer, row_idx, col, None, &value)?;
        }
    }
    Ok(())
}

fn write_cells<W: std::io::Write>(
    writer: &mut Writer<W>,
    row_idx: u32,
    cells: &RowPatches,
) -> std::io::Result<()> {
    for (col, value) in cells {
        write_patched_cell(writer, row_idx, *col, None, value)?;
    }
    Ok(())
}

/// Emit a `<c>` element carrying the patched value. Strings go in as inline
/// strings so the shared-string table is left alone; numbers as plain `<v>`.
fn write_patched_cell<W: std::io::Write>(
    writer: &mut Writer<W>,
    row_idx: u32,
    col_idx: u32,
    style: Option<&str>,
    value: &CellValue,
) -> std::io::Result<()> {
    let cell_ref = CellRef::new(row_idx, col_idx).to_string();
    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", cell_ref.as_str()));
    if let Some(style) = style {
        cell.push_attribute(("s", style));
    }

    match value {
        CellValue::Number(n) => {
            writer.write_event(Event::Start(cell))?;
            writer.write_event(Event::Start(BytesStart::new("v")))?;
            writer.write_event(Event::Text(BytesText::new(&n.to_string())))?;
            writer.write_event(Event::End(BytesEnd::new("v")))?;
        }
        CellValue::Text(s) => {
            cell.push_attribute(("t", "inlineStr"));
            writer.write_event(Event::Start(cell))?;
            writer.write_event(Event::Start(BytesStart::new("is")))?;
            let mut t = BytesStart::new("t");
            t.push_attribute(("xml:space", "preserve"));
            writer.write_event(Event::Start(t))?;
            writer.write_event(Event::Text(BytesText::new(s)))?;
            writer.write_event(Event::End(BytesEnd::new("t")))?;
            writer.write_event(Event::End(BytesEnd::new("is")))?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}
