//! 指令包与状态包
//!
//! Protocol 2.0 帧格式：
//!
//! ```text
//! | FF FF FD 00 | ID | LEN_L LEN_H | INST | PARAM... | CRC_L CRC_H |
//! ```
//!
//! LEN 统计 INST 到 CRC（含）的字节数，即 `params.len() + 3`。
//! CRC-16 多项式 0x8005，初值 0，覆盖包头到最后一个参数字节。
//!
//! 本实现不做 FF FF FD 转义（byte stuffing）：本控制器交换的寄存器
//! 载荷不会出现该序列。

use crate::ProtocolError;
use crate::registers::Instruction;

/// 包头
pub const HEADER: [u8; 4] = [0xFF, 0xFF, 0xFD, 0x00];

/// 包头 + ID + LEN 的固定前缀长度
///
/// 接收端先读这 7 个字节，再根据 LEN 读剩余部分。
pub const PREFIX_LEN: usize = 7;

/// 状态包中 INST + ERR + CRC 的开销字节数
pub const STATUS_OVERHEAD: usize = 4;

/// 计算 DYNAMIXEL CRC-16（多项式 0x8005，MSB 优先，初值 0）
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x8005;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// 指令包构建器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionPacket {
    pub id: u8,
    pub instruction: Instruction,
    pub params: Vec<u8>,
}

impl InstructionPacket {
    pub fn new(id: u8, instruction: Instruction, params: Vec<u8>) -> Self {
        Self {
            id,
            instruction,
            params,
        }
    }

    /// Ping 指令（无参数）
    pub fn ping(id: u8) -> Self {
        Self::new(id, Instruction::Ping, Vec::new())
    }

    /// Read 指令：从 `address` 读 `length` 字节
    pub fn read(id: u8, address: u16, length: u16) -> Self {
        let mut params = Vec::with_capacity(4);
        params.extend_from_slice(&address.to_le_bytes());
        params.extend_from_slice(&length.to_le_bytes());
        Self::new(id, Instruction::Read, params)
    }

    /// Write 指令：向 `address` 写 `data`
    pub fn write(id: u8, address: u16, data: &[u8]) -> Self {
        let mut params = Vec::with_capacity(2 + data.len());
        params.extend_from_slice(&address.to_le_bytes());
        params.extend_from_slice(data);
        Self::new(id, Instruction::Write, params)
    }

    /// Sync Read 指令（广播 ID 0xFE）：读多个 ID 的同一地址
    pub fn sync_read(address: u16, length: u16, ids: &[u8]) -> Self {
        let mut params = Vec::with_capacity(4 + ids.len());
        params.extend_from_slice(&address.to_le_bytes());
        params.extend_from_slice(&length.to_le_bytes());
        params.extend_from_slice(ids);
        Self::new(0xFE, Instruction::SyncRead, params)
    }

    /// Sync Write 指令（广播 ID 0xFE）：写多个 ID 的同一地址
    ///
    /// `entries` 中每一项为 (id, data)，data 长度必须等于 `length`。
    pub fn sync_write(address: u16, length: u16, entries: &[(u8, Vec<u8>)]) -> Self {
        let mut params = Vec::with_capacity(4 + entries.len() * (1 + length as usize));
        params.extend_from_slice(&address.to_le_bytes());
        params.extend_from_slice(&length.to_le_bytes());
        for (id, data) in entries {
            debug_assert_eq!(data.len(), length as usize);
            params.push(*id);
            params.extend_from_slice(data);
        }
        Self::new(0xFE, Instruction::SyncWrite, params)
    }

    /// 序列化为线上字节
    pub fn serialize(&self) -> Vec<u8> {
        let length = (self.params.len() + 3) as u16;
        let mut bytes = Vec::with_capacity(PREFIX_LEN + length as usize);
        bytes.extend_from_slice(&HEADER);
        bytes.push(self.id);
        bytes.extend_from_slice(&length.to_le_bytes());
        bytes.push(self.instruction.into());
        bytes.extend_from_slice(&self.params);
        let crc = crc16(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes
    }
}

/// 解析后的状态包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPacket {
    pub id: u8,
    /// 硬件错误字节（0 表示正常）
    pub error: u8,
    pub params: Vec<u8>,
}

impl StatusPacket {
    /// 从完整的线上字节解析状态包
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < PREFIX_LEN + STATUS_OVERHEAD {
            return Err(ProtocolError::TooShort {
                expected: PREFIX_LEN + STATUS_OVERHEAD,
                actual: bytes.len(),
            });
        }
        if bytes[..4] != HEADER {
            return Err(ProtocolError::InvalidHeader([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ]));
        }
        let id = bytes[4];
        let declared = u16::from_le_bytes([bytes[5], bytes[6]]) as usize;
        if bytes.len() != PREFIX_LEN + declared {
            return Err(ProtocolError::LengthMismatch {
                declared,
                actual: bytes.len() - PREFIX_LEN,
            });
        }

        let crc_offset = bytes.len() - 2;
        let received = u16::from_le_bytes([bytes[crc_offset], bytes[crc_offset + 1]]);
        let calculated = crc16(&bytes[..crc_offset]);
        if calculated != received {
            return Err(ProtocolError::CrcMismatch {
                calculated,
                received,
            });
        }

        let instruction = bytes[7];
        if instruction != u8::from(Instruction::Status) {
            return Err(ProtocolError::UnexpectedInstruction(instruction));
        }
        let error = bytes[8];
        let params = bytes[9..crc_offset].to_vec();
        Ok(Self { id, error, params })
    }

    /// 由前缀中的 LEN 字段计算整包剩余字节数
    ///
    /// 接收端读完 [`PREFIX_LEN`] 字节的前缀后，调用此函数得知还需
    /// 读取多少字节才构成完整状态包。
    pub fn remaining_len(prefix: &[u8; PREFIX_LEN]) -> Result<usize, ProtocolError> {
        if prefix[..4] != HEADER {
            return Err(ProtocolError::InvalidHeader([
                prefix[0], prefix[1], prefix[2], prefix[3],
            ]));
        }
        Ok(u16::from_le_bytes([prefix[5], prefix[6]]) as usize)
    }

    /// 状态包是否携带硬件错误
    pub fn is_error(&self) -> bool {
        self.error != 0
    }

    /// 构建状态包线上字节（测试与 mock 用）
    pub fn serialize(id: u8, error: u8, params: &[u8]) -> Vec<u8> {
        let length = (params.len() + 4) as u16;
        let mut bytes = Vec::with_capacity(PREFIX_LEN + length as usize);
        bytes.extend_from_slice(&HEADER);
        bytes.push(id);
        bytes.extend_from_slice(&length.to_le_bytes());
        bytes.push(Instruction::Status.into());
        bytes.push(error);
        bytes.extend_from_slice(params);
        let crc = crc16(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 官方文档给出的 Ping 包样例：ID 1 的 Ping 帧 CRC 为 0x4E19
    #[test]
    fn test_ping_golden_bytes() {
        let bytes = InstructionPacket::ping(1).serialize();
        assert_eq!(
            bytes,
            vec![0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x03, 0x00, 0x01, 0x19, 0x4E]
        );
    }

    #[test]
    fn test_crc16_empty() {
        assert_eq!(crc16(&[]), 0);
    }

    #[test]
    fn test_read_packet_layout() {
        // 读 ID 2 地址 132 的 4 字节
        let bytes = InstructionPacket::read(2, 132, 4).serialize();
        assert_eq!(&bytes[..4], &HEADER);
        assert_eq!(bytes[4], 2);
        // LEN = 4 参数 + 3
        assert_eq!(u16::from_le_bytes([bytes[5], bytes[6]]), 7);
        assert_eq!(bytes[7], 0x02);
        assert_eq!(&bytes[8..12], &[132, 0, 4, 0]);
    }

    #[test]
    fn test_sync_write_layout() {
        let entries = vec![(1u8, vec![0xF8, 0xFF]), (2u8, vec![0x10, 0x00])];
        let packet = InstructionPacket::sync_write(102, 2, &entries);
        assert_eq!(packet.id, 0xFE);
        // 参数 = 地址(2) + 长度(2) + 2 × (id + 2 字节数据)
        assert_eq!(packet.params.len(), 10);
        assert_eq!(&packet.params[..4], &[102, 0, 2, 0]);
        assert_eq!(&packet.params[4..7], &[1, 0xF8, 0xFF]);
        assert_eq!(&packet.params[7..10], &[2, 0x10, 0x00]);
    }

    #[test]
    fn test_sync_read_layout() {
        let packet = InstructionPacket::sync_read(132, 4, &[1, 2]);
        assert_eq!(packet.id, 0xFE);
        assert_eq!(packet.params, vec![132, 0, 4, 0, 1, 2]);
    }

    #[test]
    fn test_status_roundtrip() {
        let bytes = StatusPacket::serialize(1, 0, &[0x18, 0xFC, 0xFF, 0xFF]);
        let status = StatusPacket::parse(&bytes).unwrap();
        assert_eq!(status.id, 1);
        assert_eq!(status.error, 0);
        assert_eq!(status.params, vec![0x18, 0xFC, 0xFF, 0xFF]);
        assert!(!status.is_error());
    }

    #[test]
    fn test_status_error_byte() {
        let bytes = StatusPacket::serialize(2, 0x04, &[]);
        let status = StatusPacket::parse(&bytes).unwrap();
        assert!(status.is_error());
        assert_eq!(status.error, 0x04);
    }

    #[test]
    fn test_parse_bad_header() {
        let mut bytes = StatusPacket::serialize(1, 0, &[]);
        bytes[2] = 0x00;
        assert!(matches!(
            StatusPacket::parse(&bytes),
            Err(ProtocolError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_parse_bad_crc() {
        let mut bytes = StatusPacket::serialize(1, 0, &[1, 2]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(
            StatusPacket::parse(&bytes),
            Err(ProtocolError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_truncated() {
        let bytes = StatusPacket::serialize(1, 0, &[1, 2, 3, 4]);
        assert!(StatusPacket::parse(&bytes[..6]).is_err());
    }

    #[test]
    fn test_parse_instruction_packet_as_status_fails() {
        let bytes = InstructionPacket::ping(1).serialize();
        assert!(matches!(
            StatusPacket::parse(&bytes),
            Err(ProtocolError::UnexpectedInstruction(0x01))
        ));
    }

    #[test]
    fn test_remaining_len() {
        let bytes = StatusPacket::serialize(1, 0, &[0xAA; 4]);
        let mut prefix = [0u8; PREFIX_LEN];
        prefix.copy_from_slice(&bytes[..PREFIX_LEN]);
        let remaining = StatusPacket::remaining_len(&prefix).unwrap();
        assert_eq!(PREFIX_LEN + remaining, bytes.len());
    }
}
