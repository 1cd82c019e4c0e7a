use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use quick_xml::{
    Reader,
    encoding::Decoder,
    events::{BytesStart, Event},
};

use crate::{
    error::{ParseError, StartupError},
    record::RawItem,
};

const ITEM_TAG: &[u8] = b"item";

/// Streams `item` elements out of an XML document, one at a time.
///
/// The first four attributes of each element are read positionally as city,
/// street, house and floor. Iteration stops after the first error, and a
/// document that ends with elements still open is an error.
pub struct XmlSource<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
    done: bool,
}

impl XmlSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StartupError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| StartupError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> XmlSource<R> {
    pub fn from_reader(inner: R) -> Self {
        XmlSource {
            reader: Reader::from_reader(inner),
            buf: Vec::new(),
            depth: 0,
            done: false,
        }
    }

    fn next_item(&mut self) -> Result<Option<RawItem>, ParseError> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(element) => {
                    self.depth += 1;
                    if element.local_name().as_ref() == ITEM_TAG {
                        return raw_item(&element, self.reader.decoder()).map(Some);
                    }
                }
                Event::Empty(element) if element.local_name().as_ref() == ITEM_TAG => {
                    return raw_item(&element, self.reader.decoder()).map(Some);
                }
                Event::End(_) => self.depth = self.depth.saturating_sub(1),
                Event::Eof if self.depth > 0 => {
                    return Err(ParseError::UnclosedDocument { open: self.depth });
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for XmlSource<R> {
    type Item = Result<RawItem, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_item() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn raw_item(element: &BytesStart, decoder: Decoder) -> Result<RawItem, ParseError> {
    let mut values = Vec::with_capacity(4);
    for attr in element.attributes().take(4) {
        let attr = attr?;
        values.push(attr.decode_and_unescape_value(decoder)?.into_owned());
    }
    let found = values.len();
    let mut values = values.into_iter();
    match (values.next(), values.next(), values.next(), values.next()) {
        (Some(city), Some(street), Some(house), Some(floor)) => Ok(RawItem {
            city,
            street,
            house,
            floor,
        }),
        _ => Err(ParseError::MissingAttribute { found }),
    }
}
