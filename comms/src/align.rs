/// Word types usable as receive buffers, their alignment lets the spin rows
/// inside a frame be viewed in place as `i32`s.
pub trait Align4: bytemuck::Pod {}

macro_rules! align4 {
    ($($ty:ty),*) => {
        $(impl Align4 for $ty {})*
    };
}

align4!(u32, i32, u64, i64);
