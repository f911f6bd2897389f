//! [`UdpRadio`] implements [`Radio`] over UDP datagrams instead of an
//! nRF24 chip, for bench setups where the node (or a simulator) is
//! bridged onto the network.
//!
//! Each datagram is one radio packet: the 5 byte destination address
//! followed by the payload (at most 32 bytes). A packet addressed to
//! an open reading pipe is acknowledged straight away, the way the
//! nRF24 auto-ACK does, with the next ACK payload queued on that pipe
//! (or an empty ACK if none is queued).

use std::{
    collections::{HashMap, VecDeque},
    io::ErrorKind,
    net::{SocketAddr, UdpSocket},
    time::Duration,
};

use capsense_payload::{
    config::{RadioAddress, ADDRESS_LEN},
    MAX_PAYLOAD_LEN,
};

use crate::radio::{PaLevel, Radio, RadioError, NUM_PIPES};

/// Depth of the nRF24 TX FIFO that holds ACK payloads
const ACK_FIFO_DEPTH: usize = 3;

struct Packet {
    pipe: u8,
    payload: Vec<u8>,
}

pub struct UdpRadio {
    bind_addr: SocketAddr,
    socket: Option<UdpSocket>,
    dynamic_payloads: bool,
    ack_payloads: bool,
    pa_level: PaLevel,
    listening: bool,
    writing_pipe: Option<RadioAddress>,
    reading_pipes: [Option<RadioAddress>; NUM_PIPES as usize],
    ack_queue: HashMap<u8, VecDeque<Vec<u8>>>,
    pending: Option<Packet>,
}

impl UdpRadio {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            socket: None,
            dynamic_payloads: false,
            ack_payloads: false,
            pa_level: PaLevel::default(),
            listening: false,
            writing_pipe: None,
            reading_pipes: [None; NUM_PIPES as usize],
            ack_queue: HashMap::new(),
            pending: None,
        }
    }

    /// Address the socket actually bound to, once started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    fn socket(&self) -> Result<&UdpSocket, RadioError> {
        self.socket.as_ref().ok_or(RadioError::NotStarted)
    }

    fn check_pipe(pipe: u8) -> Result<usize, RadioError> {
        if pipe < NUM_PIPES {
            Ok(pipe as usize)
        } else {
            Err(RadioError::InvalidPipe(pipe))
        }
    }

    /// Transmit `payload` to the writing pipe address at `peer` and
    /// wait up to `timeout` for the ACK. Returns the ACK payload, or
    /// `None` when no ACK arrived (the caller counts a TX error).
    pub fn write(
        &mut self,
        peer: SocketAddr,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, RadioError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(RadioError::PayloadTooLarge(payload.len()));
        }
        let address = self.writing_pipe.ok_or(RadioError::InvalidPipe(0))?;
        let socket = self.socket()?;

        let mut frame = Vec::with_capacity(ADDRESS_LEN + payload.len());
        frame.extend_from_slice(&address);
        frame.extend_from_slice(payload);
        socket.send_to(&frame, peer)?;

        socket.set_nonblocking(false)?;
        socket.set_read_timeout(Some(timeout))?;
        let mut buffer = [0u8; ADDRESS_LEN + MAX_PAYLOAD_LEN];
        let res = socket.recv_from(&mut buffer);
        socket.set_nonblocking(true)?;

        match res {
            Ok((len, _)) if len >= ADDRESS_LEN && buffer[..ADDRESS_LEN] == address => {
                Ok(Some(buffer[ADDRESS_LEN..len].to_vec()))
            }
            Ok((len, from)) => {
                log::warn!("Ignoring {len} byte reply from {from} not addressed to us");
                Ok(None)
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                log::debug!("No ACK within {timeout:?}");
                Ok(None)
            }
            Err(e) => Err(RadioError::from(e)),
        }
    }

    fn receive_one(&mut self) -> Result<Option<Packet>, RadioError> {
        let mut buffer = [0u8; 512];
        let (len, from) = match self.socket()?.recv_from(&mut buffer) {
            Ok(res) => res,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(RadioError::from(e)),
        };

        if len < ADDRESS_LEN {
            log::warn!("Dropping runt packet of {len} bytes from {from}");
            return Ok(None);
        }

        let address = &buffer[..ADDRESS_LEN];
        let Some(pipe) = self
            .reading_pipes
            .iter()
            .position(|p| p.as_ref().map(|a| a.as_slice()) == Some(address))
        else {
            log::trace!("Packet from {from} for another address {}", hex::encode(address));
            return Ok(None);
        };
        let pipe = pipe as u8;

        let mut payload = buffer[ADDRESS_LEN..len].to_vec();
        if payload.len() > MAX_PAYLOAD_LEN {
            log::warn!("Truncating {} byte payload from {from}", payload.len());
            payload.truncate(MAX_PAYLOAD_LEN);
        }

        // auto-ACK, echoing the address back like the radio does
        let mut ack = address.to_vec();
        if self.ack_payloads {
            if let Some(queued) = self.ack_queue.get_mut(&pipe).and_then(|q| q.pop_front()) {
                ack.extend_from_slice(&queued);
            }
        }
        if let Err(e) = self.socket()?.send_to(&ack, from) {
            log::error!("Unable to ACK packet from {from}: {e:}");
        }

        Ok(Some(Packet { pipe, payload }))
    }
}

impl Radio for UdpRadio {
    fn begin(&mut self) -> Result<(), RadioError> {
        let socket = UdpSocket::bind(self.bind_addr)
            .map_err(|e| RadioError::NotResponding(format!("bind {}: {e:}", self.bind_addr)))?;
        socket.set_nonblocking(true)?;
        self.socket = Some(socket);
        Ok(())
    }

    fn enable_dynamic_payloads(&mut self) -> Result<(), RadioError> {
        self.dynamic_payloads = true;
        Ok(())
    }

    fn enable_ack_payload(&mut self) -> Result<(), RadioError> {
        self.ack_payloads = true;
        Ok(())
    }

    fn set_pa_level(&mut self, level: PaLevel) -> Result<(), RadioError> {
        self.pa_level = level;
        Ok(())
    }

    fn open_writing_pipe(&mut self, address: RadioAddress) -> Result<(), RadioError> {
        self.writing_pipe = Some(address);
        Ok(())
    }

    fn open_reading_pipe(&mut self, pipe: u8, address: RadioAddress) -> Result<(), RadioError> {
        let idx = Self::check_pipe(pipe)?;
        self.reading_pipes[idx] = Some(address);
        Ok(())
    }

    fn start_listening(&mut self) -> Result<(), RadioError> {
        self.socket()?;
        self.listening = true;
        Ok(())
    }

    fn stop_listening(&mut self) -> Result<(), RadioError> {
        self.listening = false;
        Ok(())
    }

    fn available(&mut self) -> Result<Option<u8>, RadioError> {
        if !self.listening {
            return Ok(None);
        }
        if self.pending.is_none() {
            self.pending = self.receive_one()?;
        }
        Ok(self.pending.as_ref().map(|p| p.pipe))
    }

    fn dynamic_payload_size(&mut self) -> Result<usize, RadioError> {
        if self.dynamic_payloads {
            Ok(self.pending.as_ref().map(|p| p.payload.len()).unwrap_or(0))
        } else {
            Ok(MAX_PAYLOAD_LEN)
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, RadioError> {
        let Some(packet) = self.pending.take() else {
            return Ok(0);
        };
        let n = packet.payload.len().min(buf.len());
        buf[..n].copy_from_slice(&packet.payload[..n]);
        Ok(n)
    }

    fn write_ack_payload(&mut self, pipe: u8, payload: &[u8]) -> Result<(), RadioError> {
        Self::check_pipe(pipe)?;
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(RadioError::PayloadTooLarge(payload.len()));
        }
        let queue = self.ack_queue.entry(pipe).or_default();
        if queue.len() >= ACK_FIFO_DEPTH {
            return Err(RadioError::AckFifoFull(pipe));
        }
        queue.push_back(payload.to_vec());
        Ok(())
    }

    fn details(&self) -> String {
        let mut details = format!(
            "UDP link bound to\t\t= {}\n\
             Channel\t\t\t= {}\n\
             PA Power\t\t\t= {:?}\n\
             Dynamic payloads\t\t= {}\n\
             ACK payloads\t\t\t= {}\n\
             Listening\t\t\t= {}\n",
            self.local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "<not started>".to_string()),
            capsense_payload::config::channel(),
            self.pa_level,
            self.dynamic_payloads,
            self.ack_payloads,
            self.listening,
        );
        if let Some(tx) = self.writing_pipe {
            details.push_str(&format!(
                "TX address\t\t\t= {}\n",
                String::from_utf8_lossy(&tx)
            ));
        }
        for (pipe, address) in self.reading_pipes.iter().enumerate() {
            if let Some(address) = address {
                details.push_str(&format!(
                    "pipe {pipe} RX address\t\t= {}\n",
                    String::from_utf8_lossy(address)
                ));
            }
        }
        details
    }
}
