use super::{ClickatellClient, ClickatellError, Command, expect_payload, single};
use crate::domain::{
    BatchId, BatchOptions, Msisdn, Response, SendOptions, TemplateContext, reject_reserved,
};
use crate::transport;

/// A templated batch: `start`, any number of `send_msg`, then `end`.
///
/// The gateway expires forgotten batches after 24 hours, but callers should
/// still end them; [`ClickatellClient::run_batch`] does so on every exit path.
pub struct Batch<'a> {
    client: &'a mut ClickatellClient,
    options: BatchOptions,
    id: Option<BatchId>,
}

impl<'a> Batch<'a> {
    pub(super) fn new(
        client: &'a mut ClickatellClient,
        options: BatchOptions,
        id: Option<BatchId>,
    ) -> Self {
        Self {
            client,
            options,
            id,
        }
    }

    /// Id of the running batch, if started (or resumed) and not yet ended.
    pub fn id(&self) -> Option<&BatchId> {
        self.id.as_ref()
    }

    /// Batch-level options, already merged with the client defaults.
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Open the batch on the gateway and remember its id.
    ///
    /// Errors:
    /// - [`ClickatellError::Validation`] when no template is set or a
    ///   companion option is missing,
    /// - [`ClickatellError::Gateway`] when the gateway answers `ERR`.
    pub async fn start(&mut self) -> Result<BatchId, ClickatellError> {
        let template = self.options.check()?;
        let params = transport::encode_start_batch(template, &self.options);

        let token = self.client.token().await?;
        let mut all = transport::encode_session(&token);
        all.extend(params);
        let records = self.client.gateway.call(Command::StartBatch, all).await?;
        let record = single(Command::StartBatch, records)?;
        let raw = record.raw.clone();
        let payload = expect_payload(Command::StartBatch, record)?;

        let id = BatchId::new(payload.value).map_err(|_| ClickatellError::UnexpectedResponse {
            command: Command::StartBatch.path(),
            raw,
        })?;
        tracing::debug!(batch_id = %id, "clickatell batch started");
        self.id = Some(id.clone());
        Ok(id)
    }

    /// Send the batch template to `recipient`, filling placeholders from `context`.
    ///
    /// Returns the gateway's record for this item; an `Err` record means this
    /// item was rejected. Context or extra keys naming a parameter the client
    /// sets itself (`to`, `batch_id`, ...) fail with
    /// [`ClickatellError::Validation`] before any network call.
    pub async fn send_msg(
        &mut self,
        recipient: &Msisdn,
        context: &TemplateContext,
        options: &SendOptions,
    ) -> Result<Response, ClickatellError> {
        let Some(id) = self.id.as_ref() else {
            return Err(ClickatellError::BatchNotStarted);
        };
        reject_reserved(context.keys().chain(options.extra.keys()))?;
        let params = transport::encode_send_item(id, recipient, context, options);

        let token = self.client.token().await?;
        let mut all = transport::encode_session(&token);
        all.extend(params);
        let records = self.client.gateway.call(Command::SendItem, all).await?;
        single(Command::SendItem, records)
    }

    /// Close the batch. Without a running batch this is a no-op.
    ///
    /// The id is kept when the gateway could not be reached (authentication,
    /// transport, HTTP or parse failure), so `end` can be retried. Once the
    /// gateway has answered, the handle forgets the id even if it answered `ERR`.
    pub async fn end(&mut self) -> Result<(), ClickatellError> {
        let Some(id) = self.id.clone() else {
            return Ok(());
        };
        let params = transport::encode_end_batch(&id);

        let token = self.client.token().await?;
        let mut all = transport::encode_session(&token);
        all.extend(params);
        let records = self.client.gateway.call(Command::EndBatch, all).await?;
        self.id = None;
        expect_payload(Command::EndBatch, single(Command::EndBatch, records)?)?;
        tracing::debug!(batch_id = %id, "clickatell batch ended");
        Ok(())
    }
}
