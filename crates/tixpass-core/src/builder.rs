//! Pass structure builder.
//!
//! Turns ticket metadata, one consolidated barcode and a color triple into a
//! [`PassDefinition`]. The builder never fails: missing metadata leaves
//! fields out, and unusable titles fall back to safe defaults.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::consolidate::ConsolidatedBarcode;
use crate::pass::{PassBarcode, PassDefinition, PassField, PassStructure};
use crate::ticket::{DocumentType, PassColors, TicketExtraction, present};

/// Fallback title when neither the title nor any alternative is usable.
pub const DEFAULT_TITLE: &str = "Digital Pass";
/// Fallback description.
pub const DEFAULT_DESCRIPTION: &str = "Digital pass";
/// Timestamp format for `expirationDate` and `relevantDate`.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const MAX_TITLE: usize = 60;
const MAX_HEADER: usize = 25;
const MAX_LOGO_TEXT: usize = 20;
const MAX_DESCRIPTION: usize = 80;
const MAX_ALT_TEXT: usize = 32;
const MAX_TOKEN: usize = 24;
const MIN_HEX_RUN: usize = 16;

/// Options for [`PassBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderOptions {
    /// Organization name used when the metadata has none. Default: `"Add2Wallet"`.
    pub organization: String,
    /// Pass type identifier used when the signing certificate provides none.
    pub pass_type_identifier: String,
    /// Team identifier used when the signing certificate provides none.
    pub team_identifier: String,
    /// App Store ids written to `associatedStoreIdentifiers`.
    pub associated_store_identifiers: Option<Vec<u64>>,
    /// Days until expiry when the event date is unknown. Default: 90.
    pub expiry_days: i64,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            organization: "Add2Wallet".to_string(),
            pass_type_identifier: "pass.com.example.default".to_string(),
            team_identifier: "TEAM000000".to_string(),
            associated_store_identifiers: None,
            expiry_days: 90,
        }
    }
}

impl BuilderOptions {
    /// Set the App Store id from its string form; invalid ids are ignored.
    pub fn with_app_store_id(mut self, value: &str) -> Self {
        if let Ok(id) = value.trim().parse::<u64>() {
            self.associated_store_identifiers = Some(vec![id]);
        }
        self
    }
}

/// Position of a ticket among the passes generated from one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketSlot {
    /// 1-based ticket number.
    pub number: usize,
    pub total: usize,
}

impl TicketSlot {
    pub const SINGLE: TicketSlot = TicketSlot { number: 1, total: 1 };

    pub fn new(number: usize, total: usize) -> Self {
        Self { number, total }
    }

    pub fn is_multiple(&self) -> bool {
        self.total > 1
    }
}

/// Everything one pass is built from.
#[derive(Debug, Clone, Copy)]
pub struct PassInput<'a> {
    pub ticket: &'a TicketExtraction,
    pub barcode: Option<&'a ConsolidatedBarcode>,
    pub colors: &'a PassColors,
    pub slot: TicketSlot,
    /// Name of the source document, shown on the back of the pass.
    pub source_filename: Option<&'a str>,
}

/// Builds pass definitions.
#[derive(Debug, Clone, Default)]
pub struct PassBuilder {
    options: BuilderOptions,
}

impl PassBuilder {
    pub fn new(options: BuilderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Build a definition with the given identifiers and a fresh serial.
    pub fn build(
        &self,
        input: &PassInput<'_>,
        pass_type_identifier: &str,
        team_identifier: &str,
    ) -> PassDefinition {
        let mut def = self.build_at(input, Utc::now().naive_utc());
        def.pass_type_identifier = pass_type_identifier.to_string();
        def.team_identifier = team_identifier.to_string();
        def
    }

    /// Build a definition using the option identifiers, with `now` as the
    /// reference time for the default expiry.
    pub fn build_at(&self, input: &PassInput<'_>, now: NaiveDateTime) -> PassDefinition {
        let ticket = input.ticket;
        let base_title = sanitize_title(ticket);
        let mut title = base_title.clone();
        let mut description = build_description(ticket);
        if input.slot.is_multiple() {
            title = format!("{title} (#{})", input.slot.number);
            description = format!(
                "{description} - Ticket {} of {}",
                input.slot.number, input.slot.total
            );
        }

        let organization = present(&ticket.organization)
            .unwrap_or(self.options.organization.as_str())
            .to_string();
        let structure = build_structure(ticket, &base_title, &title, input.source_filename);

        let barcode = input.barcode.and_then(|b| {
            let format = b.format?;
            let mut barcode = PassBarcode::new(format, b.pass_message());
            if b.text.chars().count() <= MAX_ALT_TEXT {
                barcode.alt_text = Some(b.text.clone());
            }
            Some(barcode)
        });

        let event = event_datetime(ticket);
        let mut def = PassDefinition {
            format_version: 1,
            pass_type_identifier: self.options.pass_type_identifier.clone(),
            serial_number: uuid::Uuid::new_v4().to_string(),
            team_identifier: self.options.team_identifier.clone(),
            organization_name: organization,
            description,
            logo_text: Some(truncate_chars(&title, MAX_LOGO_TEXT)),
            foreground_color: Some(input.colors.foreground.to_string()),
            background_color: Some(input.colors.background.to_string()),
            label_color: Some(input.colors.label.to_string()),
            barcodes: barcode.clone().map(|b| vec![b]),
            barcode,
            expiration_date: Some(compute_expiry(ticket, now, self.options.expiry_days)),
            relevant_date: event
                .filter(|(_, has_time)| *has_time)
                .map(|(dt, _)| dt.format(DATE_FORMAT).to_string()),
            associated_store_identifiers: self.options.associated_store_identifiers.clone(),
            ..PassDefinition::default()
        };

        match ticket.document_type {
            DocumentType::EventTicket => def.event_ticket = Some(structure),
            DocumentType::BoardingPass => {
                def.boarding_pass = Some(PassStructure {
                    transit_type: Some("PKTransitTypeAir".to_string()),
                    ..structure
                });
            }
            DocumentType::Transit => {
                def.boarding_pass = Some(PassStructure {
                    transit_type: Some("PKTransitTypeTrain".to_string()),
                    ..structure
                });
            }
            DocumentType::Hotel | DocumentType::Generic => def.generic = Some(structure),
        }
        def
    }
}

fn build_structure(
    ticket: &TicketExtraction,
    base_title: &str,
    title: &str,
    source_filename: Option<&str>,
) -> PassStructure {
    let mut s = PassStructure::default();
    s.header_fields.push(PassField::new(
        "header",
        ticket.document_type.label(),
        truncate_chars(base_title, MAX_HEADER),
    ));
    s.primary_fields.push(PassField::new("title", "", title));

    if let Some(date) = present(&ticket.date) {
        s.secondary_fields.push(PassField::new("date", "Date", date));
    }
    if let Some(time) = present(&ticket.time) {
        s.secondary_fields.push(PassField::new("time", "Time", time));
    }
    if let Some(seat) = present(&ticket.seat_info) {
        s.secondary_fields.push(PassField::new("seat", "Seat", seat));
    } else if let Some(gate) = present(&ticket.gate_info) {
        s.secondary_fields.push(PassField::new("gate", "Gate", gate));
    }

    if let Some(venue) = present(&ticket.venue_name) {
        s.auxiliary_fields.push(PassField::new("venue", "Venue", venue));
    }
    if let Some(performer) = present(&ticket.performer) {
        s.auxiliary_fields
            .push(PassField::new("performer", "Artist", performer));
    } else if let Some(org) = present(&ticket.organization).filter(|o| *o != base_title) {
        s.auxiliary_fields
            .push(PassField::new("organizer", "Organizer", org));
    }
    if let Some(confirmation) = present(&ticket.confirmation_number) {
        s.auxiliary_fields
            .push(PassField::new("confirmation", "Confirmation", confirmation));
    }
    if let Some(price) = present(&ticket.price) {
        s.auxiliary_fields.push(PassField::new("price", "Price", price));
    }

    if let Some(address) = present(&ticket.venue_address) {
        s.back_fields
            .push(PassField::new("venue_address", "Address", address));
    }
    if let Some(name) = source_filename.map(str::trim).filter(|n| !n.is_empty()) {
        s.back_fields
            .push(PassField::new("source", "Generated from", name));
    }
    s
}

/// Whether `text` is fit to show as a title.
///
/// Rejects empty text, hex or UUID-shaped identifiers, text that is mostly
/// digits and punctuation, and single unbroken tokens longer than 24 chars.
pub fn is_presentable(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || looks_like_identifier(text) {
        return false;
    }
    let non_space: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    let letters = non_space.iter().filter(|c| c.is_alphabetic()).count();
    if (letters as f64) < 0.4 * non_space.len() as f64 {
        return false;
    }
    !(non_space.len() == text.chars().count() && non_space.len() > MAX_TOKEN)
}

fn looks_like_identifier(text: &str) -> bool {
    let stripped: Vec<char> = text.chars().filter(|c| *c != '-').collect();
    stripped.len() >= MIN_HEX_RUN && stripped.iter().all(char::is_ascii_hexdigit)
}

/// The title shown on the pass, at most 60 chars.
///
/// Falls back to the event name, then the organization, then
/// [`DEFAULT_TITLE`].
pub fn sanitize_title(ticket: &TicketExtraction) -> String {
    [
        Some(ticket.title.as_str()),
        ticket.event_name.as_deref(),
        ticket.organization.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|t| is_presentable(t))
    .map(|t| truncate_chars(t, MAX_TITLE))
    .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// `date • time • venue`, at most 80 chars, or [`DEFAULT_DESCRIPTION`].
///
/// Date and time are kept as given; an unpresentable venue is left out.
pub fn build_description(ticket: &TicketExtraction) -> String {
    let venue = present(&ticket.venue_name).filter(|v| is_presentable(v));
    let parts: Vec<&str> = [present(&ticket.date), present(&ticket.time), venue]
        .into_iter()
        .flatten()
        .filter(|p| !looks_like_identifier(p))
        .collect();
    if parts.is_empty() {
        return DEFAULT_DESCRIPTION.to_string();
    }
    truncate_chars(&parts.join(" \u{2022} "), MAX_DESCRIPTION)
}

/// Truncate to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Parse an event date in the formats ticket issuers print.
///
/// Day-first is preferred for numeric dates; month-first is used only when
/// day-first cannot be valid.
pub fn parse_event_date(text: &str) -> Option<NaiveDate> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d/%m/%Y",
        "%m/%d/%Y",
        "%d.%m.%Y",
        "%d-%m-%Y",
        "%d %B %Y",
        "%B %d, %Y",
        "%B %d %Y",
        "%a %d %B %Y",
        "%A, %B %d, %Y",
        "%a, %d %B %Y",
    ];
    let text = text.trim();
    if let Some(date) = text
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    {
        return Some(date);
    }
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(&collapsed, f).ok())
}

/// Parse an event time such as `20:30`, `8:30 PM` or `20h30`.
pub fn parse_event_time(text: &str) -> Option<NaiveTime> {
    const FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M%p", "%I%p", "%Hh%M", "%Hh"];
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect::<String>()
        .to_uppercase()
        .replace('H', "h");
    FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(&compact, f).ok())
}

/// The event start, and whether a time of day was known.
pub fn event_datetime(ticket: &TicketExtraction) -> Option<(NaiveDateTime, bool)> {
    let date = parse_event_date(present(&ticket.date)?)?;
    match present(&ticket.time).and_then(parse_event_time) {
        Some(time) => Some((date.and_time(time), true)),
        None => Some((date.and_hms_opt(0, 0, 0)?, false)),
    }
}

/// Expiry: 03:00 on the day after the event, else `now + fallback_days`.
pub fn compute_expiry(ticket: &TicketExtraction, now: NaiveDateTime, fallback_days: i64) -> String {
    let expiry = event_datetime(ticket)
        .and_then(|(event, _)| event.date().succ_opt())
        .and_then(|day| day.and_hms_opt(3, 0, 0))
        .unwrap_or_else(|| now + Duration::days(fallback_days));
    expiry.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{BarcodeCandidate, DetectionMethod};
    use crate::consolidate::consolidate;
    use crate::geometry::BBox;
    use crate::hints::ContextHints;
    use crate::symbology::Symbology;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn concert() -> TicketExtraction {
        TicketExtraction {
            document_type: DocumentType::EventTicket,
            title: "Blue Note Jazz Night".into(),
            organization: Some("Blue Note".into()),
            venue_name: Some("Blue Note Club".into()),
            venue_address: Some("131 W 3rd St".into()),
            date: Some("2026-03-14".into()),
            time: Some("20:00".into()),
            seat_info: Some("Row C 12".into()),
            gate_info: Some("Door 2".into()),
            confirmation_number: Some("BN-7781".into()),
            price: Some("$45".into()),
            ..TicketExtraction::default()
        }
    }

    fn barcode(symbology: Symbology, payload: &str) -> ConsolidatedBarcode {
        let c = BarcodeCandidate::new(
            symbology,
            payload.as_bytes().to_vec(),
            BBox::from_xywh(0.0, 0.0, 10.0, 10.0),
            90,
            DetectionMethod::EmbeddedImage,
            1,
            0,
        );
        let hints = ContextHints::from_filename("x.pdf");
        let result = consolidate(&[c], &hints);
        result
            .barcodes
            .into_iter()
            .chain(result.unsupported)
            .next()
            .unwrap()
    }

    fn build(ticket: &TicketExtraction, barcode: Option<&ConsolidatedBarcode>, slot: TicketSlot) -> PassDefinition {
        let colors = PassColors::default();
        let input = PassInput {
            ticket,
            barcode,
            colors: &colors,
            slot,
            source_filename: Some("concert.pdf"),
        };
        PassBuilder::default().build_at(&input, now())
    }

    #[test]
    fn event_ticket_layout() {
        let def = build(&concert(), None, TicketSlot::SINGLE);
        let s = def.event_ticket.as_ref().unwrap();
        assert!(def.generic.is_none());
        assert_eq!(s.header_fields[0].label, "EVENT");
        assert_eq!(s.header_fields[0].value, "Blue Note Jazz Night");
        assert_eq!(s.primary_fields[0].key, "title");
        assert_eq!(s.primary_fields[0].label, "");
        let secondary: Vec<&str> = s.secondary_fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(secondary, vec!["date", "time", "seat"]);
        let auxiliary: Vec<&str> = s.auxiliary_fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(auxiliary, vec!["venue", "organizer", "confirmation", "price"]);
        let back: Vec<&str> = s.back_fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(back, vec!["venue_address", "source"]);
        assert!(s.transit_type.is_none());
    }

    #[test]
    fn gate_only_without_seat_and_performer_over_organizer() {
        let mut t = concert();
        t.seat_info = None;
        t.performer = Some("Quartet".into());
        let def = build(&t, None, TicketSlot::SINGLE);
        let s = def.event_ticket.unwrap();
        assert_eq!(s.secondary_fields[2].key, "gate");
        assert_eq!(s.auxiliary_fields[1].key, "performer");
        assert_eq!(s.auxiliary_fields[1].label, "Artist");
    }

    #[test]
    fn organizer_omitted_when_same_as_title() {
        let t = TicketExtraction {
            title: "Blue Note".into(),
            organization: Some("Blue Note".into()),
            ..TicketExtraction::default()
        };
        let def = build(&t, None, TicketSlot::SINGLE);
        assert!(def.generic.unwrap().auxiliary_fields.is_empty());
    }

    #[test]
    fn boarding_and_transit_styles() {
        let mut t = concert();
        t.document_type = DocumentType::BoardingPass;
        let def = build(&t, None, TicketSlot::SINGLE);
        assert_eq!(
            def.boarding_pass.unwrap().transit_type.as_deref(),
            Some("PKTransitTypeAir")
        );
        t.document_type = DocumentType::Transit;
        let def = build(&t, None, TicketSlot::SINGLE);
        assert_eq!(
            def.boarding_pass.unwrap().transit_type.as_deref(),
            Some("PKTransitTypeTrain")
        );
        t.document_type = DocumentType::Hotel;
        let def = build(&t, None, TicketSlot::SINGLE);
        assert!(def.generic.is_some());
    }

    #[test]
    fn top_level_fields() {
        let def = build(&concert(), None, TicketSlot::SINGLE);
        assert_eq!(def.format_version, 1);
        assert_eq!(def.organization_name, "Blue Note");
        assert_eq!(def.pass_type_identifier, "pass.com.example.default");
        assert_eq!(def.team_identifier, "TEAM000000");
        assert_eq!(def.background_color.as_deref(), Some("rgb(0, 122, 255)"));
        assert_eq!(def.logo_text.as_deref(), Some("Blue Note Jazz Night"));
        assert_eq!(
            def.description,
            "2026-03-14 \u{2022} 20:00 \u{2022} Blue Note Club"
        );
        assert_eq!(def.serial_number.len(), 36);
        assert!(def.barcode.is_none());
        assert!(def.barcodes.is_none());
    }

    #[test]
    fn default_organization() {
        let def = build(&TicketExtraction::titled("Museum Entry"), None, TicketSlot::SINGLE);
        assert_eq!(def.organization_name, "Add2Wallet");
        assert_eq!(def.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn multiple_ticket_suffixes() {
        let def = build(&concert(), None, TicketSlot::new(2, 3));
        let s = def.event_ticket.as_ref().unwrap();
        assert_eq!(s.primary_fields[0].value, "Blue Note Jazz Night (#2)");
        assert_eq!(s.header_fields[0].value, "Blue Note Jazz Night");
        assert!(def.description.ends_with(" - Ticket 2 of 3"));
        let other = build(&concert(), None, TicketSlot::new(3, 3));
        assert_ne!(def.serial_number, other.serial_number);
    }

    #[test]
    fn barcode_and_alt_text() {
        let b = barcode(Symbology::Ean13, "4006381333931");
        let def = build(&concert(), Some(&b), TicketSlot::SINGLE);
        let pk = def.barcode.as_ref().unwrap();
        assert_eq!(pk.format, "PKBarcodeFormatCode128");
        assert_eq!(pk.message, "4006381333931");
        assert_eq!(pk.message_encoding, "iso-8859-1");
        assert_eq!(pk.alt_text.as_deref(), Some("4006381333931"));
        assert_eq!(def.barcodes.as_ref().unwrap(), &vec![pk.clone()]);
    }

    #[test]
    fn long_message_has_no_alt_text() {
        let b = barcode(Symbology::QrCode, &"X".repeat(33));
        let def = build(&concert(), Some(&b), TicketSlot::SINGLE);
        assert!(def.barcode.unwrap().alt_text.is_none());
    }

    #[test]
    fn unsupported_barcode_is_not_embedded() {
        let b = barcode(Symbology::DataMatrix, "DM-PAYLOAD");
        let def = build(&concert(), Some(&b), TicketSlot::SINGLE);
        assert!(def.barcode.is_none());
        assert!(def.barcodes.is_none());
    }

    #[test]
    fn hex_title_falls_back() {
        let mut t = TicketExtraction::titled("3f2a9c0e4b5d6e7f8a9b0c1d2e3f4a5b");
        assert_eq!(sanitize_title(&t), DEFAULT_TITLE);
        t.event_name = Some("Summer Festival".into());
        assert_eq!(sanitize_title(&t), "Summer Festival");
        t.event_name = Some("0000-1111-2222-3333".into());
        t.organization = Some("Festival Org".into());
        assert_eq!(sanitize_title(&t), "Festival Org");
    }

    #[test]
    fn presentable_rules() {
        assert!(is_presentable("Hamilton"));
        assert!(!is_presentable("   "));
        assert!(!is_presentable("123-456 789/00"));
        assert!(!is_presentable("Supercalifragilisticexpialidocious"));
        assert!(is_presentable("The Phantom of the Opera at Her Majesty's"));
        assert!(!is_presentable("550e8400-e29b-41d4-a716-446655440000"));
    }

    #[test]
    fn title_truncated_to_sixty() {
        let long = "Word ".repeat(20);
        let t = TicketExtraction::titled(long);
        assert_eq!(sanitize_title(&t).chars().count(), 60);
    }

    #[test]
    fn date_formats() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(parse_event_date("2026-03-14"), Some(d));
        assert_eq!(parse_event_date("2026-03-14T20:00:00"), Some(d));
        assert_eq!(parse_event_date("14/03/2026"), Some(d));
        assert_eq!(parse_event_date("03/14/2026"), Some(d));
        assert_eq!(parse_event_date("14 March 2026"), Some(d));
        assert_eq!(parse_event_date("14 Mar 2026"), Some(d));
        assert_eq!(parse_event_date("March 14, 2026"), Some(d));
        assert_eq!(parse_event_date("Mar 14, 2026"), Some(d));
        assert_eq!(parse_event_date("14.03.2026"), Some(d));
        assert_eq!(parse_event_date("someday"), None);
        // Ambiguous numeric dates are read day-first.
        assert_eq!(
            parse_event_date("04/03/2026"),
            NaiveDate::from_ymd_opt(2026, 3, 4)
        );
    }

    #[test]
    fn time_formats() {
        let t = NaiveTime::from_hms_opt(20, 30, 0).unwrap();
        assert_eq!(parse_event_time("20:30"), Some(t));
        assert_eq!(parse_event_time("8:30 PM"), Some(t));
        assert_eq!(parse_event_time("8:30pm"), Some(t));
        assert_eq!(parse_event_time("20h30"), Some(t));
        assert_eq!(parse_event_time("late"), None);
    }

    #[test]
    fn expiry_day_after_event() {
        let def = build(&concert(), None, TicketSlot::SINGLE);
        assert_eq!(def.expiration_date.as_deref(), Some("2026-03-15T03:00:00Z"));
        assert_eq!(def.relevant_date.as_deref(), Some("2026-03-14T20:00:00Z"));
    }

    #[test]
    fn expiry_without_date_is_ninety_days() {
        let t = TicketExtraction::titled("Gift Card");
        assert_eq!(compute_expiry(&t, now(), 90), "2026-04-10T12:00:00Z");
        let def = build(&t, None, TicketSlot::SINGLE);
        assert!(def.relevant_date.is_none());
    }

    #[test]
    fn relevant_date_needs_time() {
        let mut t = concert();
        t.time = None;
        let def = build(&t, None, TicketSlot::SINGLE);
        assert!(def.relevant_date.is_none());
        assert_eq!(def.expiration_date.as_deref(), Some("2026-03-15T03:00:00Z"));
    }

    #[test]
    fn store_id_option() {
        let opts = BuilderOptions::default().with_app_store_id("6448263945");
        assert_eq!(opts.associated_store_identifiers, Some(vec![6448263945]));
        let opts = BuilderOptions::default().with_app_store_id("abc");
        assert_eq!(opts.associated_store_identifiers, None);
    }

    #[test]
    fn description_truncated() {
        let mut t = concert();
        t.venue_name = Some("Very Long Venue Name ".repeat(6));
        assert_eq!(build_description(&t).chars().count(), 80);
    }
}
