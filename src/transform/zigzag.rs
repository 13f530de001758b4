/// Zig-zag scan order for an NxN block.
///
/// Entry `i` is the row-major index of the `i`-th coefficient in zig-zag
/// order; for N = 8 this is the JPEG scan order. Even anti-diagonals run
/// bottom-left to top-right, odd ones top-right to bottom-left.
pub fn zigzag(size: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(size * size);
    if size == 0 {
        return order;
    }
    for diagonal in 0..(2 * size - 1) {
        let low = diagonal.saturating_sub(size - 1);
        let high = diagonal.min(size - 1);
        if diagonal % 2 == 0 {
            for row in (low..=high).rev() {
                order.push(row * size + (diagonal - row));
            }
        } else {
            for row in low..=high {
                order.push(row * size + (diagonal - row));
            }
        }
    }
    order
}
