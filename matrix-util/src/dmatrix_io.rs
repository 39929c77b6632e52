use crate::common_io::{read_lines_of_words_delim, write_lines, Delimiter, ReadLinesOut};
use crate::traits::*;
pub use nalgebra::DMatrix;

use std::fmt::{Debug, Display};
use std::str::FromStr;

impl<T> IoOps for DMatrix<T>
where
    T: nalgebra::Scalar + FromStr + Display + Copy + Send,
    <T as FromStr>::Err: Debug,
{
    type Scalar = T;
    type Mat = Self;

    fn read_data(
        file_path: &str,
        delim: impl Into<Delimiter>,
        row_name_index: Option<usize>,
    ) -> anyhow::Result<MatWithNames<Self::Mat>> {
        let ReadLinesOut { lines, header } = read_lines_of_words_delim(file_path, delim, 0)?;

        if lines.is_empty() {
            anyhow::bail!("no data in {}", file_path);
        }

        let nwords = lines[0].len();
        let ncols = if row_name_index.is_some() {
            nwords.saturating_sub(1)
        } else {
            nwords
        };

        // a header may or may not carry a label for the row-name column
        let cols: Vec<Box<str>> = match (row_name_index, header.len()) {
            (Some(r), n) if n == nwords => header
                .into_iter()
                .enumerate()
                .filter(|&(j, _)| j != r)
                .map(|(_, x)| x)
                .collect(),
            (_, n) if n == ncols => header,
            (_, n) => anyhow::bail!(
                "{}: header has {} names but rows have {} data columns",
                file_path,
                n,
                ncols
            ),
        };

        let nrows = lines.len();
        let mut rows = Vec::with_capacity(nrows);
        let mut data = Vec::with_capacity(nrows * ncols);

        for (i, words) in lines.into_iter().enumerate() {
            if words.len() != nwords {
                anyhow::bail!(
                    "{}: line {} has {} columns, expected {}",
                    file_path,
                    i + 2,
                    words.len(),
                    nwords
                );
            }
            for (j, w) in words.into_iter().enumerate() {
                if Some(j) == row_name_index {
                    rows.push(w);
                } else {
                    let x = w.parse::<T>().map_err(|e| {
                        anyhow::anyhow!("{}: failed to parse {:?}: {:?}", file_path, w, e)
                    })?;
                    data.push(x);
                }
            }
            if row_name_index.is_none() {
                rows.push(i.to_string().into_boxed_str());
            }
        }

        Ok(MatWithNames {
            rows,
            cols,
            mat: DMatrix::<T>::from_row_iterator(nrows, ncols, data),
        })
    }

    fn write_data(
        &self,
        rows: &[Box<str>],
        cols: &[Box<str>],
        file: &str,
        delim: &str,
    ) -> anyhow::Result<()> {
        if rows.len() != self.nrows() || cols.len() != self.ncols() {
            anyhow::bail!(
                "names ({} x {}) do not match the matrix ({} x {})",
                rows.len(),
                cols.len(),
                self.nrows(),
                self.ncols()
            );
        }

        let mut lines: Vec<Box<str>> = Vec::with_capacity(self.nrows() + 1);
        let hdr = std::iter::once("row")
            .chain(cols.iter().map(|c| c.as_ref()))
            .collect::<Vec<_>>()
            .join(delim);
        lines.push(hdr.into_boxed_str());

        for (r, row) in rows.iter().zip(self.row_iter()) {
            let vals = row
                .iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join(delim);
            lines.push(format!("{}{}{}", r, delim, vals).into_boxed_str());
        }

        write_lines(&lines, file)
    }
}
