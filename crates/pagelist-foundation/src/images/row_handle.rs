/// Opaque handle to a bound list row, owned by the UI layer.
///
/// Image begin/cancel calls are expected to be idempotent and non-blocking;
/// they may enqueue work internally, but that is the collaborator's concern.
pub trait RowHandle {
    /// Stable identity used as the recycling key while the row stays bound.
    fn recycle_key(&self) -> u64;

    /// Starts (or restarts) loading this row's images.
    fn begin_image_load(&self);

    /// Cancels any in-flight image load for this row.
    fn cancel_image_load(&self);
}
