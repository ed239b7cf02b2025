mod chained;
pub use chained::ChainedPipe;

use crate::Error;

pub trait Pipe {
    type Input;
    type Output;

    type Error;

    fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, Self::Error>;

    fn pipe<P>(self, other: P) -> ChainedPipe<Self, P, Self::Output, Self::Error>
    where
        Self: Sized,
        P: Pipe<Input = Self::Output, Error = Self::Error>,
    {
        ChainedPipe::new(self, other)
    }

    // errors only visible at end of stream
    fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct TryCollector<P: Producer, C> {
    _s: std::marker::PhantomData<(P, C)>,
}

impl<P: Producer, C> TryCollector<P, C> {
    pub fn new() -> Self {
        Self {
            _s: std::marker::PhantomData,
        }
    }
}

impl<P: Producer, C> Default for TryCollector<P, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O, P, C> Pipe for TryCollector<P, C>
where
    P: Producer<Item = Result<O, Error>>,
    C: FromIterator<O>,
{
    type Input = P;

    type Output = C;

    type Error = Error;

    fn process(&mut self, mut input: Self::Input) -> Result<Option<Self::Output>, Self::Error> {
        Result::<C, Self::Error>::from_iter(std::iter::from_fn(|| input.produce())).map(Some)
    }
}

#[derive(Debug)]
pub struct OwnedProducer<P: Producer>(Option<P>);

impl<T: Producer> Producer for OwnedProducer<T> {
    type Item = T;

    fn produce(&mut self) -> Option<Self::Item> {
        self.0.take()
    }
}

pub trait Producer {
    type Item;
    fn produce(&mut self) -> Option<Self::Item>;

    fn producer(self) -> OwnedProducer<Self>
    where
        Self: Sized,
    {
        OwnedProducer(Some(self))
    }

    fn feed<P>(self, other: P) -> ChainedPipe<Self, P, Self::Item, P::Error>
    where
        Self: Sized,
        P: Pipe<Input = Self::Item>,
    {
        ChainedPipe::new(self, other)
    }
}

impl<T> Producer for T
where
    T: Iterator,
{
    type Item = <T as Iterator>::Item;

    fn produce(&mut self) -> Option<Self::Item> {
        <Self as Iterator>::next(self)
    }
}

#[cfg(test)]
struct Halve;

#[cfg(test)]
impl Pipe for Halve {
    type Input = u32;
    type Output = u32;
    type Error = Error;

    fn process(&mut self, input: u32) -> Result<Option<u32>, Error> {
        Ok((input % 2 == 0).then_some(input / 2))
    }
}

#[cfg(test)]
struct FailOnClose;

#[cfg(test)]
impl Pipe for FailOnClose {
    type Input = u32;
    type Output = u32;
    type Error = Error;

    fn process(&mut self, input: u32) -> Result<Option<u32>, Error> {
        Ok(Some(input))
    }

    fn close(&mut self) -> Result<(), Error> {
        Err(Error::DuplicateSite { id: 0 })
    }
}

#[test]
fn chained_pipe_skips_filtered_items() {
    let mut pipes = (1..=6u32).feed(Halve.pipe(Halve));
    let halved: Vec<_> = std::iter::from_fn(|| pipes.produce())
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(halved, vec![1]);
}

#[test]
fn close_error_is_produced_once_after_input() {
    let mut pipes = [1u32, 2].into_iter().feed(FailOnClose);
    assert!(matches!(pipes.produce(), Some(Ok(1))));
    assert!(matches!(pipes.produce(), Some(Ok(2))));
    assert!(matches!(pipes.produce(), Some(Err(Error::DuplicateSite { .. }))));
    assert!(pipes.produce().is_none());
}

#[test]
fn try_collector_stops_at_close_error() {
    let mut pipes = [1u32, 2]
        .into_iter()
        .feed(FailOnClose)
        .producer()
        .feed(TryCollector::<_, Vec<u32>>::new());
    assert!(matches!(pipes.produce(), Some(Err(Error::DuplicateSite { .. }))));
}
