//! Text filter applied to table listings.

use documental_core::model::RecordView;

/// True when Nombre or Codigo contains `text`, ignoring case. Blank text matches everything.
pub fn matches<R: RecordView + ?Sized>(record: &R, text: &str) -> bool {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    record.nombre().to_lowercase().contains(&needle)
        || record.codigo().to_lowercase().contains(&needle)
}

/// Keep the records whose Nombre or Codigo contains `text`, in their original order.
pub fn filter_records<R, I>(records: I, text: &str) -> Vec<R>
where
    R: RecordView,
    I: IntoIterator<Item = R>,
{
    records.into_iter().filter(|r| matches(r, text)).collect()
}
