//! Entity model for the seven hierarchy levels.
//!
//! Each level is a typed struct implementing [`Record`]. Field access by name goes
//! through the static field list of the level, never through runtime reflection:
//! the list drives SQL columns, spreadsheet headers, and text parsing alike.

use crate::kind::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Int,
    Bool,
}

/// A named field of an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Text,
    }
}

const fn int(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Int,
    }
}

const fn boolean(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Bool,
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

/// Errors raised while building or validating records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("{kind}: {field} is required")]
    Required {
        kind: EntityKind,
        field: &'static str,
    },
    #[error("{kind}: unknown field '{field}'")]
    UnknownField { kind: EntityKind, field: String },
    #[error("{kind}: invalid value '{value}' for {field} (expected {expected})")]
    InvalidValue {
        kind: EntityKind,
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl FieldValue {
    /// Parse spreadsheet or command-line text into a value of the given type.
    ///
    /// Blank text yields the type's default (empty, 0, false).
    pub fn parse(ty: FieldType, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match ty {
            FieldType::Text => Some(Self::Text(raw.to_string())),
            FieldType::Int => parse_int(raw).map(Self::Int),
            FieldType::Bool => parse_bool(raw).map(Self::Bool),
        }
    }

    /// Render the value as it appears in a spreadsheet cell.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    fn coerce(self, ty: FieldType) -> Option<Self> {
        match (ty, self) {
            (FieldType::Text, Self::Text(s)) => Some(Self::Text(s)),
            (FieldType::Int, Self::Int(n)) => Some(Self::Int(n)),
            (FieldType::Bool, Self::Bool(b)) => Some(Self::Bool(b)),
            (FieldType::Int, Self::Bool(b)) => Some(Self::Int(i64::from(b))),
            (FieldType::Bool, Self::Int(n)) => match n {
                0 => Some(Self::Bool(false)),
                1 => Some(Self::Bool(true)),
                _ => None,
            },
            (ty, other) => Self::parse(ty, &other.to_text()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    if raw.is_empty() {
        return Some(0);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    // Spreadsheets hand integers back as floats ("5.0").
    let float = raw.parse::<f64>().ok()?;
    if float.fract() == 0.0 && float.abs() < 9.0e15 {
        #[allow(clippy::cast_possible_truncation)]
        return Some(float as i64);
    }
    None
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "" | "false" | "0" | "no" | "n" => Some(false),
        "true" | "1" | "si" | "sí" | "s" | "x" | "yes" => Some(true),
        _ => None,
    }
}

fn expected(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Text => "text",
        FieldType::Int => "an integer",
        FieldType::Bool => "true/false",
    }
}

/// Borrowed view of one field slot of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    Text(&'a str),
    Int(i64),
    Bool(bool),
}

/// Mutable field slot of a record.
#[derive(Debug)]
pub enum SlotMut<'a> {
    Text(&'a mut String),
    Int(&'a mut i64),
    Bool(&'a mut bool),
}

impl Slot<'_> {
    fn to_value(self) -> FieldValue {
        match self {
            Slot::Text(s) => FieldValue::Text(s.to_string()),
            Slot::Int(n) => FieldValue::Int(n),
            Slot::Bool(b) => FieldValue::Bool(b),
        }
    }
}

/// Field storage of one entity kind, keyed by the canonical names of its
/// field list. Object safe; every other capability is derived from it.
pub trait FieldAccess {
    fn entity_kind(&self) -> EntityKind;
    fn slot(&self, field: &str) -> Option<Slot<'_>>;
    fn slot_mut(&mut self, field: &str) -> Option<SlotMut<'_>>;
}

/// Read-only capability shared by every entity kind and by [`AnyRecord`].
pub trait RecordView: FieldAccess {
    fn kind(&self) -> EntityKind {
        self.entity_kind()
    }

    fn id(&self) -> &str {
        self.text_slot("Id")
    }

    fn codigo(&self) -> &str {
        self.text_slot("Codigo")
    }

    fn nombre(&self) -> &str {
        self.text_slot("Nombre")
    }

    fn observacion(&self) -> &str {
        self.text_slot("Observacion")
    }

    /// `None` at the root level.
    fn parent_id(&self) -> Option<&str> {
        let key = self.entity_kind().parent_key()?;
        Some(self.text_slot(key))
    }

    /// Field list of this record's kind, `Id` first.
    fn field_specs(&self) -> &'static [FieldSpec] {
        fields_of(self.entity_kind())
    }

    /// Read a field by name (case-insensitive).
    fn get(&self, field: &str) -> Option<FieldValue> {
        let spec = field_spec(self.field_specs(), field)?;
        self.slot(spec.name).map(Slot::to_value)
    }

    /// Field rendered as cell text; unknown fields render empty.
    fn text(&self, field: &str) -> String {
        self.get(field).map(|v| v.to_text()).unwrap_or_default()
    }

    #[doc(hidden)]
    fn text_slot(&self, field: &str) -> &str {
        match self.slot(field) {
            Some(Slot::Text(s)) => s,
            _ => "",
        }
    }
}

impl<T: FieldAccess + ?Sized> RecordView for T {}

/// Typed entity kind.
pub trait Record: FieldAccess + Clone + Default + fmt::Debug + Send + 'static {
    const KIND: EntityKind;
    const FIELDS: &'static [FieldSpec];

    fn into_any(self) -> AnyRecord;

    fn from_any(record: AnyRecord) -> Option<Self>;

    /// Write a field by name (case-insensitive), coercing the value to the field type.
    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), ModelError> {
        set_field(self, field, value)
    }

    fn set_id(&mut self, id: impl Into<String>) {
        if let Some(SlotMut::Text(slot)) = self.slot_mut("Id") {
            *slot = id.into();
        }
    }

    /// Point this record at a parent. No-op at the root level.
    fn set_parent_id(&mut self, parent_id: impl Into<String>) {
        let Some(key) = Self::KIND.parent_key() else {
            return;
        };
        if let Some(SlotMut::Text(slot)) = self.slot_mut(key) {
            *slot = parent_id.into();
        }
    }

    /// Build a record from `(field, text)` pairs. Names that are not fields of
    /// this kind are ignored; values that do not parse are errors.
    fn from_text_fields<'a, I>(pairs: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut record = Self::default();
        for (name, raw) in pairs {
            let Some(spec) = field_spec(Self::FIELDS, name) else {
                continue;
            };
            let value = FieldValue::parse(spec.ty, raw).ok_or_else(|| ModelError::InvalidValue {
                kind: Self::KIND,
                field: spec.name,
                value: raw.trim().to_string(),
                expected: expected(spec.ty),
            })?;
            record.set(spec.name, value)?;
        }
        Ok(record)
    }
}

/// Write a field of any record by name, coercing the value to the field type.
pub fn set_field<R: FieldAccess + ?Sized>(
    record: &mut R,
    field: &str,
    value: FieldValue,
) -> Result<(), ModelError> {
    let kind = record.entity_kind();
    let spec = field_spec(fields_of(kind), field).ok_or_else(|| ModelError::UnknownField {
        kind,
        field: field.to_string(),
    })?;
    let raw = value.to_text();
    let value = value.coerce(spec.ty).ok_or(ModelError::InvalidValue {
        kind,
        field: spec.name,
        value: raw,
        expected: expected(spec.ty),
    })?;
    match (record.slot_mut(spec.name), value) {
        (Some(SlotMut::Text(slot)), FieldValue::Text(v)) => *slot = v,
        (Some(SlotMut::Int(slot)), FieldValue::Int(v)) => *slot = v,
        (Some(SlotMut::Bool(slot)), FieldValue::Bool(v)) => *slot = v,
        _ => {
            return Err(ModelError::UnknownField {
                kind,
                field: spec.name.to_string(),
            });
        }
    }
    Ok(())
}

/// Look up a field spec by case-insensitive name.
pub fn field_spec(fields: &'static [FieldSpec], name: &str) -> Option<&'static FieldSpec> {
    let name = name.trim();
    fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

/// Field list for any kind.
pub fn fields_of(kind: EntityKind) -> &'static [FieldSpec] {
    match kind {
        EntityKind::Fondo => Fondo::FIELDS,
        EntityKind::Subfondo => Subfondo::FIELDS,
        EntityKind::UnidadAdministrativa => UnidadAdministrativa::FIELDS,
        EntityKind::OficinaProductora => OficinaProductora::FIELDS,
        EntityKind::Serie => Serie::FIELDS,
        EntityKind::Subserie => Subserie::FIELDS,
        EntityKind::TipoDocumental => TipoDocumental::FIELDS,
    }
}

/// Codigo and Nombre must be present before a record is persisted.
pub fn validate<R: RecordView + ?Sized>(record: &R) -> Result<(), ModelError> {
    for field in ["Codigo", "Nombre"] {
        if record.text_slot(field).trim().is_empty() {
            return Err(ModelError::Required {
                kind: record.kind(),
                field,
            });
        }
    }
    Ok(())
}

/// Slots shared by every level.
fn common_slot<'a>(
    field: &str,
    id: &'a str,
    codigo: &'a str,
    nombre: &'a str,
    observacion: &'a str,
) -> Option<Slot<'a>> {
    match field {
        "Id" => Some(Slot::Text(id)),
        "Codigo" => Some(Slot::Text(codigo)),
        "Nombre" => Some(Slot::Text(nombre)),
        "Observacion" => Some(Slot::Text(observacion)),
        _ => None,
    }
}

fn common_slot_mut<'a>(
    field: &str,
    id: &'a mut String,
    codigo: &'a mut String,
    nombre: &'a mut String,
    observacion: &'a mut String,
) -> Option<SlotMut<'a>> {
    match field {
        "Id" => Some(SlotMut::Text(id)),
        "Codigo" => Some(SlotMut::Text(codigo)),
        "Nombre" => Some(SlotMut::Text(nombre)),
        "Observacion" => Some(SlotMut::Text(observacion)),
        _ => None,
    }
}

/// Level 1: root of the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Fondo {
    pub id: String,
    pub codigo: String,
    pub nombre: String,
    pub observacion: String,
}

/// Level 2.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Subfondo {
    pub id: String,
    pub codigo: String,
    pub nombre: String,
    pub observacion: String,
    pub fondo_id: String,
}

/// Level 3.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UnidadAdministrativa {
    pub id: String,
    pub codigo: String,
    pub nombre: String,
    pub observacion: String,
    pub subfondo_id: String,
}

/// Level 4.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OficinaProductora {
    pub id: String,
    pub codigo: String,
    pub nombre: String,
    pub observacion: String,
    pub unidad_administrativa_id: String,
}

/// Level 5.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Serie {
    pub id: String,
    pub codigo: String,
    pub nombre: String,
    pub observacion: String,
    pub oficina_productora_id: String,
}

/// Level 6: carries the retention and disposition attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Subserie {
    pub id: String,
    pub codigo: String,
    pub nombre: String,
    pub observacion: String,
    pub serie_id: String,
    /// Years kept in the office archive (Archivo de Gestión).
    #[serde(rename = "AG")]
    pub ag: i64,
    /// Years kept in the central archive (Archivo Central).
    #[serde(rename = "AC")]
    pub ac: i64,
    pub papel: bool,
    pub electronico: bool,
    pub formato_digital: String,
    pub conservacion_total: bool,
    pub eliminacion: bool,
    pub medios_tecnologicos: bool,
    pub seleccion: bool,
    pub procedimiento: String,
}

/// Level 7: leaf of the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TipoDocumental {
    pub id: String,
    pub codigo: String,
    pub nombre: String,
    pub observacion: String,
    pub subserie_id: String,
    pub papel: bool,
    pub electronico: bool,
    pub formato_digital: String,
}

const FONDO_FIELDS: [FieldSpec; 4] = [
    text("Id"),
    text("Codigo"),
    text("Nombre"),
    text("Observacion"),
];
const SUBFONDO_FIELDS: [FieldSpec; 5] = with_parent("FondoId");
const UNIDAD_FIELDS: [FieldSpec; 5] = with_parent("SubfondoId");
const OFICINA_FIELDS: [FieldSpec; 5] = with_parent("UnidadAdministrativaId");
const SERIE_FIELDS: [FieldSpec; 5] = with_parent("OficinaProductoraId");
const SUBSERIE_FIELDS: [FieldSpec; 15] = [
    text("Id"),
    text("Codigo"),
    text("Nombre"),
    text("Observacion"),
    text("SerieId"),
    int("AG"),
    int("AC"),
    boolean("Papel"),
    boolean("Electronico"),
    text("FormatoDigital"),
    boolean("ConservacionTotal"),
    boolean("Eliminacion"),
    boolean("MediosTecnologicos"),
    boolean("Seleccion"),
    text("Procedimiento"),
];
const TIPO_FIELDS: [FieldSpec; 8] = [
    text("Id"),
    text("Codigo"),
    text("Nombre"),
    text("Observacion"),
    text("SubserieId"),
    boolean("Papel"),
    boolean("Electronico"),
    text("FormatoDigital"),
];

const fn with_parent(parent_key: &'static str) -> [FieldSpec; 5] {
    [
        text("Id"),
        text("Codigo"),
        text("Nombre"),
        text("Observacion"),
        text(parent_key),
    ]
}

impl FieldAccess for Fondo {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Fondo
    }

    fn slot(&self, field: &str) -> Option<Slot<'_>> {
        common_slot(field, &self.id, &self.codigo, &self.nombre, &self.observacion)
    }

    fn slot_mut(&mut self, field: &str) -> Option<SlotMut<'_>> {
        common_slot_mut(
            field,
            &mut self.id,
            &mut self.codigo,
            &mut self.nombre,
            &mut self.observacion,
        )
    }
}

impl FieldAccess for Subfondo {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Subfondo
    }

    fn slot(&self, field: &str) -> Option<Slot<'_>> {
        match field {
            "FondoId" => Some(Slot::Text(&self.fondo_id)),
            _ => common_slot(field, &self.id, &self.codigo, &self.nombre, &self.observacion),
        }
    }

    fn slot_mut(&mut self, field: &str) -> Option<SlotMut<'_>> {
        match field {
            "FondoId" => Some(SlotMut::Text(&mut self.fondo_id)),
            _ => common_slot_mut(
                field,
                &mut self.id,
                &mut self.codigo,
                &mut self.nombre,
                &mut self.observacion,
            ),
        }
    }
}

impl FieldAccess for UnidadAdministrativa {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::UnidadAdministrativa
    }

    fn slot(&self, field: &str) -> Option<Slot<'_>> {
        match field {
            "SubfondoId" => Some(Slot::Text(&self.subfondo_id)),
            _ => common_slot(field, &self.id, &self.codigo, &self.nombre, &self.observacion),
        }
    }

    fn slot_mut(&mut self, field: &str) -> Option<SlotMut<'_>> {
        match field {
            "SubfondoId" => Some(SlotMut::Text(&mut self.subfondo_id)),
            _ => common_slot_mut(
                field,
                &mut self.id,
                &mut self.codigo,
                &mut self.nombre,
                &mut self.observacion,
            ),
        }
    }
}

impl FieldAccess for OficinaProductora {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::OficinaProductora
    }

    fn slot(&self, field: &str) -> Option<Slot<'_>> {
        match field {
            "UnidadAdministrativaId" => Some(Slot::Text(&self.unidad_administrativa_id)),
            _ => common_slot(field, &self.id, &self.codigo, &self.nombre, &self.observacion),
        }
    }

    fn slot_mut(&mut self, field: &str) -> Option<SlotMut<'_>> {
        match field {
            "UnidadAdministrativaId" => Some(SlotMut::Text(&mut self.unidad_administrativa_id)),
            _ => common_slot_mut(
                field,
                &mut self.id,
                &mut self.codigo,
                &mut self.nombre,
                &mut self.observacion,
            ),
        }
    }
}

impl FieldAccess for Serie {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Serie
    }

    fn slot(&self, field: &str) -> Option<Slot<'_>> {
        match field {
            "OficinaProductoraId" => Some(Slot::Text(&self.oficina_productora_id)),
            _ => common_slot(field, &self.id, &self.codigo, &self.nombre, &self.observacion),
        }
    }

    fn slot_mut(&mut self, field: &str) -> Option<SlotMut<'_>> {
        match field {
            "OficinaProductoraId" => Some(SlotMut::Text(&mut self.oficina_productora_id)),
            _ => common_slot_mut(
                field,
                &mut self.id,
                &mut self.codigo,
                &mut self.nombre,
                &mut self.observacion,
            ),
        }
    }
}

impl FieldAccess for Subserie {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Subserie
    }

    fn slot(&self, field: &str) -> Option<Slot<'_>> {
        match field {
            "SerieId" => Some(Slot::Text(&self.serie_id)),
            "AG" => Some(Slot::Int(self.ag)),
            "AC" => Some(Slot::Int(self.ac)),
            "Papel" => Some(Slot::Bool(self.papel)),
            "Electronico" => Some(Slot::Bool(self.electronico)),
            "FormatoDigital" => Some(Slot::Text(&self.formato_digital)),
            "ConservacionTotal" => Some(Slot::Bool(self.conservacion_total)),
            "Eliminacion" => Some(Slot::Bool(self.eliminacion)),
            "MediosTecnologicos" => Some(Slot::Bool(self.medios_tecnologicos)),
            "Seleccion" => Some(Slot::Bool(self.seleccion)),
            "Procedimiento" => Some(Slot::Text(&self.procedimiento)),
            _ => common_slot(field, &self.id, &self.codigo, &self.nombre, &self.observacion),
        }
    }

    fn slot_mut(&mut self, field: &str) -> Option<SlotMut<'_>> {
        match field {
            "SerieId" => Some(SlotMut::Text(&mut self.serie_id)),
            "AG" => Some(SlotMut::Int(&mut self.ag)),
            "AC" => Some(SlotMut::Int(&mut self.ac)),
            "Papel" => Some(SlotMut::Bool(&mut self.papel)),
            "Electronico" => Some(SlotMut::Bool(&mut self.electronico)),
            "FormatoDigital" => Some(SlotMut::Text(&mut self.formato_digital)),
            "ConservacionTotal" => Some(SlotMut::Bool(&mut self.conservacion_total)),
            "Eliminacion" => Some(SlotMut::Bool(&mut self.eliminacion)),
            "MediosTecnologicos" => Some(SlotMut::Bool(&mut self.medios_tecnologicos)),
            "Seleccion" => Some(SlotMut::Bool(&mut self.seleccion)),
            "Procedimiento" => Some(SlotMut::Text(&mut self.procedimiento)),
            _ => common_slot_mut(
                field,
                &mut self.id,
                &mut self.codigo,
                &mut self.nombre,
                &mut self.observacion,
            ),
        }
    }
}

impl FieldAccess for TipoDocumental {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::TipoDocumental
    }

    fn slot(&self, field: &str) -> Option<Slot<'_>> {
        match field {
            "SubserieId" => Some(Slot::Text(&self.subserie_id)),
            "Papel" => Some(Slot::Bool(self.papel)),
            "Electronico" => Some(Slot::Bool(self.electronico)),
            "FormatoDigital" => Some(Slot::Text(&self.formato_digital)),
            _ => common_slot(field, &self.id, &self.codigo, &self.nombre, &self.observacion),
        }
    }

    fn slot_mut(&mut self, field: &str) -> Option<SlotMut<'_>> {
        match field {
            "SubserieId" => Some(SlotMut::Text(&mut self.subserie_id)),
            "Papel" => Some(SlotMut::Bool(&mut self.papel)),
            "Electronico" => Some(SlotMut::Bool(&mut self.electronico)),
            "FormatoDigital" => Some(SlotMut::Text(&mut self.formato_digital)),
            _ => common_slot_mut(
                field,
                &mut self.id,
                &mut self.codigo,
                &mut self.nombre,
                &mut self.observacion,
            ),
        }
    }
}

impl Record for Fondo {
    const KIND: EntityKind = EntityKind::Fondo;
    const FIELDS: &'static [FieldSpec] = &FONDO_FIELDS;

    fn into_any(self) -> AnyRecord {
        AnyRecord::Fondo(self)
    }

    fn from_any(record: AnyRecord) -> Option<Self> {
        match record {
            AnyRecord::Fondo(r) => Some(r),
            _ => None,
        }
    }
}

impl Record for Subfondo {
    const KIND: EntityKind = EntityKind::Subfondo;
    const FIELDS: &'static [FieldSpec] = &SUBFONDO_FIELDS;

    fn into_any(self) -> AnyRecord {
        AnyRecord::Subfondo(self)
    }

    fn from_any(record: AnyRecord) -> Option<Self> {
        match record {
            AnyRecord::Subfondo(r) => Some(r),
            _ => None,
        }
    }
}

impl Record for UnidadAdministrativa {
    const KIND: EntityKind = EntityKind::UnidadAdministrativa;
    const FIELDS: &'static [FieldSpec] = &UNIDAD_FIELDS;

    fn into_any(self) -> AnyRecord {
        AnyRecord::UnidadAdministrativa(self)
    }

    fn from_any(record: AnyRecord) -> Option<Self> {
        match record {
            AnyRecord::UnidadAdministrativa(r) => Some(r),
            _ => None,
        }
    }
}

impl Record for OficinaProductora {
    const KIND: EntityKind = EntityKind::OficinaProductora;
    const FIELDS: &'static [FieldSpec] = &OFICINA_FIELDS;

    fn into_any(self) -> AnyRecord {
        AnyRecord::OficinaProductora(self)
    }

    fn from_any(record: AnyRecord) -> Option<Self> {
        match record {
            AnyRecord::OficinaProductora(r) => Some(r),
            _ => None,
        }
    }
}

impl Record for Serie {
    const KIND: EntityKind = EntityKind::Serie;
    const FIELDS: &'static [FieldSpec] = &SERIE_FIELDS;

    fn into_any(self) -> AnyRecord {
        AnyRecord::Serie(self)
    }

    fn from_any(record: AnyRecord) -> Option<Self> {
        match record {
            AnyRecord::Serie(r) => Some(r),
            _ => None,
        }
    }
}

impl Record for Subserie {
    const KIND: EntityKind = EntityKind::Subserie;
    const FIELDS: &'static [FieldSpec] = &SUBSERIE_FIELDS;

    fn into_any(self) -> AnyRecord {
        AnyRecord::Subserie(self)
    }

    fn from_any(record: AnyRecord) -> Option<Self> {
        match record {
            AnyRecord::Subserie(r) => Some(r),
            _ => None,
        }
    }
}

impl Record for TipoDocumental {
    const KIND: EntityKind = EntityKind::TipoDocumental;
    const FIELDS: &'static [FieldSpec] = &TIPO_FIELDS;

    fn into_any(self) -> AnyRecord {
        AnyRecord::TipoDocumental(self)
    }

    fn from_any(record: AnyRecord) -> Option<Self> {
        match record {
            AnyRecord::TipoDocumental(r) => Some(r),
            _ => None,
        }
    }
}

/// A record of any level. The only heterogeneous collection element type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Kind")]
pub enum AnyRecord {
    Fondo(Fondo),
    Subfondo(Subfondo),
    UnidadAdministrativa(UnidadAdministrativa),
    OficinaProductora(OficinaProductora),
    Serie(Serie),
    Subserie(Subserie),
    TipoDocumental(TipoDocumental),
}

impl AnyRecord {
    /// An empty record of the given kind.
    pub fn empty(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Fondo => Self::Fondo(Fondo::default()),
            EntityKind::Subfondo => Self::Subfondo(Subfondo::default()),
            EntityKind::UnidadAdministrativa => {
                Self::UnidadAdministrativa(UnidadAdministrativa::default())
            }
            EntityKind::OficinaProductora => Self::OficinaProductora(OficinaProductora::default()),
            EntityKind::Serie => Self::Serie(Serie::default()),
            EntityKind::Subserie => Self::Subserie(Subserie::default()),
            EntityKind::TipoDocumental => Self::TipoDocumental(TipoDocumental::default()),
        }
    }

    fn inner(&self) -> &dyn FieldAccess {
        match self {
            Self::Fondo(r) => r,
            Self::Subfondo(r) => r,
            Self::UnidadAdministrativa(r) => r,
            Self::OficinaProductora(r) => r,
            Self::Serie(r) => r,
            Self::Subserie(r) => r,
            Self::TipoDocumental(r) => r,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn FieldAccess {
        match self {
            Self::Fondo(r) => r,
            Self::Subfondo(r) => r,
            Self::UnidadAdministrativa(r) => r,
            Self::OficinaProductora(r) => r,
            Self::Serie(r) => r,
            Self::Subserie(r) => r,
            Self::TipoDocumental(r) => r,
        }
    }

    /// Set a field by name on a record of any kind.
    pub fn set(&mut self, field: &str, value: FieldValue) -> Result<(), ModelError> {
        set_field(self, field, value)
    }

    pub fn as_subserie(&self) -> Option<&Subserie> {
        match self {
            Self::Subserie(r) => Some(r),
            _ => None,
        }
    }
}

impl FieldAccess for AnyRecord {
    fn entity_kind(&self) -> EntityKind {
        self.inner().entity_kind()
    }

    fn slot(&self, field: &str) -> Option<Slot<'_>> {
        self.inner().slot(field)
    }

    fn slot_mut(&mut self, field: &str) -> Option<SlotMut<'_>> {
        self.inner_mut().slot_mut(field)
    }
}
