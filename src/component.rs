use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Cheap, cloneable handle that delivers messages of type `M` somewhere.
///
/// Senders can be mapped so a child component posts straight into its
/// parent's inbox, wrapped in the parent's message type.
pub struct Sender<M> {
    emit: Arc<dyn Fn(M) + Send + Sync>,
}

impl<M> Clone for Sender<M> {
    fn clone(&self) -> Self {
        Self {
            emit: self.emit.clone(),
        }
    }
}

impl<M: Send + 'static> Sender<M> {
    pub fn from_channel(tx: mpsc::UnboundedSender<M>) -> Self {
        Self {
            emit: Arc::new(move |msg| {
                tx.send(msg).ok();
            }),
        }
    }

    /// Discards everything sent to it.
    pub fn sink() -> Self {
        Self {
            emit: Arc::new(|_| {}),
        }
    }

    pub fn emit(&self, msg: M) {
        (self.emit)(msg);
    }

    pub fn map<N, F>(&self, f: F) -> Sender<N>
    where
        F: Fn(N) -> M + Send + Sync + 'static,
    {
        let inner = self.clone();
        Sender {
            emit: Arc::new(move |msg| inner.emit(f(msg))),
        }
    }
}

pub trait Component: Sized + 'static {
    type Init;
    type Input: Send + 'static;
    type Output: Send + 'static;

    fn init(init: Self::Init, sender: &ComponentSender<Self>) -> Self;

    fn update(&mut self, msg: Self::Input, sender: &ComponentSender<Self>);
}

pub struct ComponentSender<C: Component> {
    input: Sender<C::Input>,
    output: Sender<C::Output>,
}

impl<C: Component> Clone for ComponentSender<C> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            output: self.output.clone(),
        }
    }
}

impl<C: Component> ComponentSender<C> {
    pub fn new(input: Sender<C::Input>, output: Sender<C::Output>) -> Self {
        Self { input, output }
    }

    pub fn input(&self, msg: C::Input) {
        self.input.emit(msg);
    }

    pub fn output(&self, msg: C::Output) {
        self.output.emit(msg);
    }

    pub fn input_sender(&self) -> &Sender<C::Input> {
        &self.input
    }

    /// Runs `fut` on the runtime and feeds its result back as an input
    /// message. Aborting the returned handle before completion drops the
    /// message.
    pub fn oneshot_command<F>(&self, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = C::Input> + Send + 'static,
    {
        let input = self.input.clone();
        tokio::spawn(async move {
            input.emit(fut.await);
        })
    }
}

/// Owns a root component together with its inbox.
pub struct Controller<C: Component> {
    model: C,
    sender: ComponentSender<C>,
    inbox: mpsc::UnboundedReceiver<C::Input>,
}

impl<C: Component> Controller<C> {
    pub fn launch(init: C::Init) -> (Self, mpsc::UnboundedReceiver<C::Output>) {
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let controller = Self::launch_with_output(init, Sender::from_channel(output_tx));
        (controller, output_rx)
    }

    pub fn launch_with_output(init: C::Init, output: Sender<C::Output>) -> Self {
        let (input_tx, inbox) = mpsc::unbounded_channel();
        let sender = ComponentSender::new(Sender::from_channel(input_tx), output);
        let model = C::init(init, &sender);
        Self {
            model,
            sender,
            inbox,
        }
    }

    pub fn model(&self) -> &C {
        &self.model
    }

    pub fn sender(&self) -> &ComponentSender<C> {
        &self.sender
    }

    /// Handles `msg` immediately, before anything already queued.
    pub fn emit(&mut self, msg: C::Input) {
        self.model.update(msg, &self.sender);
    }

    /// Waits for the next queued message and handles it.
    pub async fn next(&mut self) -> bool {
        match self.inbox.recv().await {
            Some(msg) => {
                self.model.update(msg, &self.sender);
                true
            }
            None => false,
        }
    }

    /// Handles every message that is already queued, without waiting.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.inbox.try_recv() {
            self.model.update(msg, &self.sender);
            handled += 1;
        }
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        value: i32,
    }

    enum CounterMsg {
        Add(i32),
        AddLater(i32),
    }

    impl Component for Counter {
        type Init = i32;
        type Input = CounterMsg;
        type Output = i32;

        fn init(init: i32, _sender: &ComponentSender<Self>) -> Self {
            Self { value: init }
        }

        fn update(&mut self, msg: CounterMsg, sender: &ComponentSender<Self>) {
            match msg {
                CounterMsg::Add(n) => {
                    self.value += n;
                    sender.output(self.value);
                }
                CounterMsg::AddLater(n) => {
                    sender.oneshot_command(async move { CounterMsg::Add(n) });
                }
            }
        }
    }

    #[tokio::test]
    async fn commands_feed_back_into_the_inbox() {
        let (mut counter, mut outputs) = Controller::<Counter>::launch(1);
        counter.emit(CounterMsg::AddLater(4));
        assert_eq!(counter.model().value, 1);

        assert!(counter.next().await);
        assert_eq!(counter.model().value, 5);
        assert_eq!(outputs.recv().await, Some(5));
    }

    #[test]
    fn mapped_sender_wraps_messages() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Option<i32>>();
        let sender = Sender::from_channel(tx).map(Some);
        sender.emit(7);
        assert_eq!(rx.try_recv().ok(), Some(Some(7)));
    }
}
