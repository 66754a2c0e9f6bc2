//! Dense row-major 2D fields shared by every baking stage.

use rayon::prelude::*;

/// A dense 2D array stored in row-major order.
///
/// Index `(x, y)` lives at `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T: Clone> Grid2<T> {
    /// Creates a grid with every cell set to `value`.
    pub fn filled(width: u32, height: u32, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; (width as usize) * (height as usize)],
        }
    }
}

impl<T> Grid2<T> {
    /// Wraps an existing row-major buffer.
    ///
    /// Returns `None` if `data.len() != width * height`.
    pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self { width, height, data })
    }

    /// Returns the number of columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Returns a reference to the cell at `(x, y)`.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> &T {
        &self.data[self.index(x, y)]
    }

    /// Overwrites the cell at `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: T) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    /// Returns the row-major cell buffer.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterates cells in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }
}

impl<T: Send + Sync> Grid2<T> {
    /// Builds a grid by evaluating `f(x, y)` for every cell.
    ///
    /// Rows are filled in parallel; the result does not depend on scheduling
    /// because every cell is a pure function of its coordinates.
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        T: Default + Clone,
        F: Fn(u32, u32) -> T + Send + Sync,
    {
        let mut data = vec![T::default(); (width as usize) * (height as usize)];
        if width > 0 {
            data.par_chunks_mut(width as usize)
                .enumerate()
                .for_each(|(y, row)| {
                    for (x, cell) in row.iter_mut().enumerate() {
                        *cell = f(x as u32, y as u32);
                    }
                });
        }
        Self { width, height, data }
    }

    /// Applies `f` elementwise, producing a new grid of the same shape.
    pub fn map<U, F>(&self, f: F) -> Grid2<U>
    where
        U: Send,
        F: Fn(&T) -> U + Send + Sync,
    {
        Grid2 {
            width: self.width,
            height: self.height,
            data: self.data.par_iter().map(f).collect(),
        }
    }

    /// Combines two same-shaped grids elementwise.
    ///
    /// # Panics
    /// Panics if the two grids have different dimensions.
    pub fn zip_map<U, V, F>(&self, other: &Grid2<U>, f: F) -> Grid2<V>
    where
        U: Send + Sync,
        V: Send,
        F: Fn(&T, &U) -> V + Send + Sync,
    {
        assert_eq!(
            self.dimensions(),
            other.dimensions(),
            "zip_map requires grids of equal shape"
        );
        Grid2 {
            width: self.width,
            height: self.height,
            data: self
                .data
                .par_iter()
                .zip(other.data.par_iter())
                .map(|(a, b)| f(a, b))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_row_major() {
        let g = Grid2::from_fn(3, 2, |x, y| x + 10 * y);
        assert_eq!(g.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(*g.get(2, 1), 12);
    }

    #[test]
    fn test_filled_and_set() {
        let mut g = Grid2::filled(4, 4, 0.0f64);
        g.set(1, 3, 2.5);
        assert_eq!(*g.get(1, 3), 2.5);
        assert_eq!(g.iter().filter(|&&v| v != 0.0).count(), 1);
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(Grid2::from_vec(2, 2, vec![1u8; 3]).is_none());
        assert!(Grid2::from_vec(2, 2, vec![1u8; 4]).is_some());
    }

    #[test]
    fn test_zip_map() {
        let a = Grid2::from_fn(2, 2, |x, _| x as f64);
        let b = Grid2::from_fn(2, 2, |_, y| y == 1);
        let c = a.zip_map(&b, |&v, &keep| if keep { v } else { -1.0 });
        assert_eq!(c.as_slice(), &[-1.0, -1.0, 0.0, 1.0]);
    }

    #[test]
    #[should_panic(expected = "equal shape")]
    fn test_zip_map_shape_mismatch_panics() {
        let a = Grid2::filled(2, 2, 0u8);
        let b = Grid2::filled(3, 2, 0u8);
        let _ = a.zip_map(&b, |x, y| x + y);
    }
}
