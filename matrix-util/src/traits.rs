use crate::common_io::Delimiter;

/// A matrix with row and column names, e.g., cells × markers
#[derive(Clone, Debug)]
pub struct MatWithNames<M> {
    pub rows: Vec<Box<str>>,
    pub cols: Vec<Box<str>>,
    pub mat: M,
}

/// Read and write named matrices from and to delimited files
pub trait IoOps {
    type Scalar;
    type Mat;

    /// Read a matrix with a header line of column names.
    ///
    /// * `file` - file name--either gzipped or not
    /// * `delim` - delimiter
    /// * `row_name_index` - column holding row names (`None`: number rows `0..n`)
    fn read_data(
        file: &str,
        delim: impl Into<Delimiter>,
        row_name_index: Option<usize>,
    ) -> anyhow::Result<MatWithNames<Self::Mat>>;

    fn from_tsv(tsv_file: &str, row_name_index: Option<usize>) -> anyhow::Result<MatWithNames<Self::Mat>> {
        Self::read_data(tsv_file, "\t", row_name_index)
    }

    /// Write the matrix with a header line; the first column holds `rows`
    fn write_data(
        &self,
        rows: &[Box<str>],
        cols: &[Box<str>],
        file: &str,
        delim: &str,
    ) -> anyhow::Result<()>;
}
